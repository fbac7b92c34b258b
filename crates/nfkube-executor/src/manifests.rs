//! Kubernetes manifests for the Nextflow head job.

use std::collections::BTreeMap;
use std::path::Path;

use k8s_openapi::ByteString;
use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{
    Capabilities, Container, EnvVar, PersistentVolumeClaimVolumeSource, PodSecurityContext,
    PodSpec, PodTemplateSpec, ResourceRequirements, SeccompProfile, Secret, SecretVolumeSource,
    SecurityContext, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use nfkube_core::{Error, LaunchSpec, ResourceRequest, Result, VolumeRecord};

/// `generateName` prefix of the config secret.
pub const CONFIG_SECRET_PREFIX: &str = "nf-config-";
/// Where the config secret is mounted in the head container.
pub const CONFIG_MOUNT_PATH: &str = "/etc/nextflow";
pub const CONFIG_VOLUME_NAME: &str = "nextflow-config";
/// Namespace file of the in-cluster service account.
pub const SERVICE_ACCOUNT_NAMESPACE: &str = "/run/secrets/kubernetes.io/serviceaccount/namespace";

const DEFAULT_NAMESPACE: &str = "default";
const HEAD_USER_ID: i64 = 1000;

/// Pick the namespace: the config value, then the service account's
/// namespace when running in a pod, then `default`.
pub fn resolve_namespace(configured: Option<&str>, service_account_file: &Path) -> String {
    if let Some(ns) = configured.filter(|ns| !ns.is_empty()) {
        return ns.to_string();
    }
    std::fs::read_to_string(service_account_file)
        .ok()
        .map(|ns| ns.trim().to_string())
        .filter(|ns| !ns.is_empty())
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string())
}

/// Environment for the head container: the executor defaults plus every
/// `NXF_*` variable of `vars`, sorted by name. Variables from `vars`
/// override the defaults.
pub fn nextflow_env<I>(vars: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut env = vec![
        ("NXF_EXECUTOR".to_string(), "k8s".to_string()),
        ("NXF_ANSI_LOG".to_string(), "false".to_string()),
    ];

    let mut passed: Vec<(String, String)> = vars
        .into_iter()
        .filter(|(name, _)| name.starts_with("NXF_"))
        .collect();
    passed.sort();

    for (name, value) in passed {
        match env.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => env.push((name, value)),
        }
    }
    env
}

/// Script run by the head job before Nextflow: enter the launch directory
/// and copy the delivered config into it.
pub fn init_script(launch_dir: &str) -> String {
    format!(
        "mkdir -p '{dir}'; cd '{dir}'; cp {mount}/nextflow.config .",
        dir = launch_dir,
        mount = CONFIG_MOUNT_PATH
    )
}

/// `bash -c` command line of the head container.
pub fn head_command(nextflow_args: &[String]) -> Vec<String> {
    vec![
        "/bin/bash".to_string(),
        "-c".to_string(),
        format!(
            "source {}/init.sh; nextflow run {}",
            CONFIG_MOUNT_PATH,
            nextflow_args.join(" ")
        ),
    ]
}

/// Opaque secret carrying `init.sh` and the rendered `nextflow.config`.
pub fn build_secret(spec: &LaunchSpec) -> Secret {
    let data = BTreeMap::from([
        (
            "init.sh".to_string(),
            ByteString(init_script(&spec.launch_dir).into_bytes()),
        ),
        (
            "nextflow.config".to_string(),
            ByteString(spec.config_text.clone().into_bytes()),
        ),
    ]);

    Secret {
        metadata: ObjectMeta {
            generate_name: Some(CONFIG_SECRET_PREFIX.to_string()),
            ..Default::default()
        },
        type_: Some("Opaque".to_string()),
        data: Some(data),
        ..Default::default()
    }
}

/// Limits equal the request; the CPU request is half the limit.
pub fn build_resources(resources: &ResourceRequest) -> Result<ResourceRequirements> {
    let cpu_request = resources.cpu_request()?;
    let memory = Quantity(resources.memory.clone());

    Ok(ResourceRequirements {
        limits: Some(BTreeMap::from([
            ("cpu".to_string(), Quantity(resources.cpus.clone())),
            ("memory".to_string(), memory.clone()),
        ])),
        requests: Some(BTreeMap::from([
            ("cpu".to_string(), Quantity(cpu_request)),
            ("memory".to_string(), memory),
        ])),
        ..Default::default()
    })
}

/// The head job. `secret_name` is the created config secret.
pub fn build_job(spec: &LaunchSpec, secret_name: &str) -> Result<Job> {
    let name = spec.name.to_string();

    let container = Container {
        name: name.clone(),
        image: Some(spec.image.clone()),
        command: Some(head_command(&spec.nextflow_args)),
        resources: Some(build_resources(&spec.resources)?),
        env: Some(
            spec.env
                .iter()
                .map(|(k, v)| EnvVar {
                    name: k.clone(),
                    value: Some(v.clone()),
                    ..Default::default()
                })
                .collect(),
        ),
        security_context: Some(SecurityContext {
            run_as_user: Some(HEAD_USER_ID),
            allow_privilege_escalation: Some(false),
            capabilities: Some(Capabilities {
                drop: Some(vec!["ALL".to_string()]),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    };

    let mut pod_spec = PodSpec {
        restart_policy: Some("Never".to_string()),
        security_context: Some(PodSecurityContext {
            fs_group_change_policy: Some("OnRootMismatch".to_string()),
            run_as_non_root: Some(true),
            seccomp_profile: Some(SeccompProfile {
                type_: "RuntimeDefault".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        containers: vec![container],
        ..Default::default()
    };
    attach_volumes(&mut pod_spec, &spec.volumes, secret_name);

    Ok(Job {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            labels: Some(BTreeMap::from([
                ("app".to_string(), "nextflow".to_string()),
                ("runName".to_string(), name.clone()),
            ])),
            ..Default::default()
        },
        spec: Some(JobSpec {
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(BTreeMap::from([("job-name".to_string(), name)])),
                    ..Default::default()
                }),
                spec: Some(pod_spec),
            },
            ..Default::default()
        }),
        ..Default::default()
    })
}

/// Mount each claim as `vol-<i>`, then the config secret read-only.
pub fn attach_volumes(pod_spec: &mut PodSpec, volumes: &[VolumeRecord], secret_name: &str) {
    let mut pod_volumes = Vec::with_capacity(volumes.len() + 1);
    let mut mounts = Vec::with_capacity(volumes.len() + 1);

    for (i, record) in volumes.iter().enumerate() {
        let name = format!("vol-{}", i);
        pod_volumes.push(Volume {
            name: name.clone(),
            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                claim_name: record.claim_name.clone(),
                read_only: Some(false),
            }),
            ..Default::default()
        });
        mounts.push(VolumeMount {
            name,
            mount_path: record.mount_path.clone(),
            ..Default::default()
        });
    }

    pod_volumes.push(Volume {
        name: CONFIG_VOLUME_NAME.to_string(),
        secret: Some(SecretVolumeSource {
            secret_name: Some(secret_name.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    });
    mounts.push(VolumeMount {
        name: CONFIG_VOLUME_NAME.to_string(),
        mount_path: CONFIG_MOUNT_PATH.to_string(),
        read_only: Some(true),
        ..Default::default()
    });

    pod_spec
        .volumes
        .get_or_insert_with(Vec::new)
        .extend(pod_volumes);
    if let Some(container) = pod_spec.containers.first_mut() {
        container
            .volume_mounts
            .get_or_insert_with(Vec::new)
            .extend(mounts);
    }
}

/// Controller reference from the config secret to its job, so the secret
/// is garbage collected with the job.
pub fn owner_reference(job: &Job) -> Result<OwnerReference> {
    let name = job
        .metadata
        .name
        .clone()
        .ok_or_else(|| Error::Kubernetes("created job has no name".to_string()))?;
    let uid = job
        .metadata
        .uid
        .clone()
        .ok_or_else(|| Error::Kubernetes(format!("created job '{}' has no uid", name)))?;

    Ok(OwnerReference {
        api_version: "batch/v1".to_string(),
        kind: "Job".to_string(),
        name,
        uid,
        controller: Some(true),
        block_owner_deletion: Some(true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nfkube_core::RunName;

    fn spec() -> LaunchSpec {
        LaunchSpec {
            name: RunName::from("happy-otter"),
            namespace: None,
            image: "cerit.io/nextflow/nextflow:24.10.5".to_string(),
            nextflow_args: vec![
                "hello".to_string(),
                "-name".to_string(),
                "happy-otter".to_string(),
            ],
            resources: ResourceRequest::new("2", "4Gi"),
            env: nextflow_env(Vec::new()),
            volumes: vec![
                VolumeRecord::new("work", "/work"),
                VolumeRecord::new("ref", "/ref"),
            ],
            launch_dir: "/work/launch".to_string(),
            config_text: "k8s {\n}\n".to_string(),
        }
    }

    #[test]
    fn test_nextflow_env() {
        let env = nextflow_env(vec![
            ("PATH".to_string(), "/bin".to_string()),
            ("NXF_VER".to_string(), "24.10.5".to_string()),
            ("NXF_ANSI_LOG".to_string(), "true".to_string()),
            ("NXF_HOME".to_string(), "/home/nf".to_string()),
        ]);
        let names: Vec<_> = env.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(
            names,
            vec![
                ("NXF_EXECUTOR", "k8s"),
                ("NXF_ANSI_LOG", "true"),
                ("NXF_HOME", "/home/nf"),
                ("NXF_VER", "24.10.5"),
            ]
        );
    }

    #[test]
    fn test_resolve_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("namespace");

        assert_eq!(resolve_namespace(None, &file), "default");
        std::fs::write(&file, "team-a\n").unwrap();
        assert_eq!(resolve_namespace(None, &file), "team-a");
        assert_eq!(resolve_namespace(Some("ns1"), &file), "ns1");
        assert_eq!(resolve_namespace(Some(""), &file), "team-a");
    }

    #[test]
    fn test_secret_contents() {
        let secret = build_secret(&spec());
        assert_eq!(secret.metadata.generate_name.as_deref(), Some("nf-config-"));
        assert_eq!(secret.type_.as_deref(), Some("Opaque"));

        let data = secret.data.unwrap();
        assert_eq!(
            data["init.sh"].0,
            b"mkdir -p '/work/launch'; cd '/work/launch'; cp /etc/nextflow/nextflow.config ."
        );
        assert_eq!(data["nextflow.config"].0, b"k8s {\n}\n");
    }

    #[test]
    fn test_job_shape() {
        let job = build_job(&spec(), "nf-config-abc12").unwrap();
        assert_eq!(job.metadata.name.as_deref(), Some("happy-otter"));
        let labels = job.metadata.labels.as_ref().unwrap();
        assert_eq!(labels["app"], "nextflow");
        assert_eq!(labels["runName"], "happy-otter");

        let template = job.spec.unwrap().template;
        assert_eq!(template.metadata.unwrap().labels.unwrap()["job-name"], "happy-otter");

        let pod = template.spec.unwrap();
        assert_eq!(pod.restart_policy.as_deref(), Some("Never"));
        let pod_security = pod.security_context.as_ref().unwrap();
        assert_eq!(pod_security.run_as_non_root, Some(true));
        assert_eq!(pod_security.seccomp_profile.as_ref().unwrap().type_, "RuntimeDefault");

        let container = &pod.containers[0];
        assert_eq!(container.name, "happy-otter");
        assert_eq!(
            container.command.as_ref().unwrap()[2],
            "source /etc/nextflow/init.sh; nextflow run hello -name happy-otter"
        );

        let resources = container.resources.as_ref().unwrap();
        assert_eq!(resources.limits.as_ref().unwrap()["cpu"], Quantity("2".to_string()));
        assert_eq!(resources.requests.as_ref().unwrap()["cpu"], Quantity("1.0".to_string()));
        assert_eq!(resources.requests.as_ref().unwrap()["memory"], Quantity("4Gi".to_string()));

        let security = container.security_context.as_ref().unwrap();
        assert_eq!(security.run_as_user, Some(1000));
        assert_eq!(security.allow_privilege_escalation, Some(false));
    }

    #[test]
    fn test_job_volumes() {
        let job = build_job(&spec(), "nf-config-abc12").unwrap();
        let pod = job.spec.unwrap().template.spec.unwrap();

        let volumes = pod.volumes.unwrap();
        let names: Vec<_> = volumes.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["vol-0", "vol-1", "nextflow-config"]);
        assert_eq!(
            volumes[1].persistent_volume_claim.as_ref().unwrap().claim_name,
            "ref"
        );
        assert_eq!(
            volumes[2].secret.as_ref().unwrap().secret_name.as_deref(),
            Some("nf-config-abc12")
        );

        let mounts = pod.containers[0].volume_mounts.as_ref().unwrap();
        let paths: Vec<_> = mounts.iter().map(|m| m.mount_path.as_str()).collect();
        assert_eq!(paths, vec!["/work", "/ref", "/etc/nextflow"]);
        assert_eq!(mounts[2].read_only, Some(true));
    }

    #[test]
    fn test_bad_cpus_fail_job_build() {
        let mut spec = spec();
        spec.resources = ResourceRequest::new("many", "4Gi");
        assert!(matches!(build_job(&spec, "s"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_owner_reference_requires_uid() {
        let mut job = build_job(&spec(), "s").unwrap();
        assert!(owner_reference(&job).is_err());

        job.metadata.uid = Some("1234".to_string());
        let owner = owner_reference(&job).unwrap();
        assert_eq!(owner.kind, "Job");
        assert_eq!(owner.name, "happy-otter");
        assert_eq!(owner.controller, Some(true));
    }
}
