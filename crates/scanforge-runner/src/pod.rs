//! `Pod` backend: speaks to a cluster pod runtime, submitting a one-shot Pod
//! per call (spec §4.1).

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{
    Container, Pod, PodSpec, ResourceRequirements, TopologySpreadConstraint, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::api::{Api, DeleteParams, LogParams, ObjectMeta, PostParams};
use kube::Client;
use scanforge_core::error::RunnerError;
use tracing::debug;
use uuid::Uuid;

use crate::image::split_image_ref;
use crate::request::{RunRequest, RunResult};
use crate::Runner;

const WORKSPACE_MOUNT: &str = "/workspace";
/// Poll interval while waiting on pod phase transitions (spec §4.1: "two
/// separate bounded waits (scheduling, completion)").
const POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Upper bound on time spent waiting for the pod to leave `Pending`.
const SCHEDULING_BUDGET: Duration = Duration::from_secs(120);

pub struct PodRunner {
    client: Client,
    namespace: String,
    /// Label applied to every submitted pod and used as the
    /// `topologySpreadConstraints` selector, so concurrent runs of the same
    /// tool are scheduled across nodes (spec §4.1).
    tool_label: String,
}

impl PodRunner {
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self { client, namespace: namespace.into(), tool_label: "scanforge-scan".to_string() }
    }

    fn pods(&self) -> Api<Pod> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn build_pod(&self, name: &str, req: &RunRequest, tool: &str) -> Pod {
        let mut labels = BTreeMap::new();
        labels.insert(self.tool_label.clone(), tool.to_string());

        let volume_mounts = req.volume_path.as_ref().map(|_| {
            vec![VolumeMount {
                name: "workspace".to_string(),
                mount_path: WORKSPACE_MOUNT.to_string(),
                read_only: Some(!req.read_write_volume),
                ..Default::default()
            }]
        });
        let volumes = req.volume_path.as_ref().map(|path| {
            vec![Volume {
                name: "workspace".to_string(),
                host_path: Some(k8s_openapi::api::core::v1::HostPathVolumeSource {
                    path: path.clone(),
                    type_: Some("Directory".to_string()),
                }),
                ..Default::default()
            }]
        });

        Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                labels: Some(labels.clone()),
                ..Default::default()
            },
            spec: Some(PodSpec {
                restart_policy: Some("Never".to_string()),
                containers: vec![Container {
                    name: "scan".to_string(),
                    image: Some(req.image.clone()),
                    command: Some(req.cmd.clone()),
                    volume_mounts,
                    resources: Some(ResourceRequirements {
                        requests: Some(BTreeMap::from([
                            ("cpu".to_string(), Quantity("250m".to_string())),
                            ("memory".to_string(), Quantity("256Mi".to_string())),
                        ])),
                        ..Default::default()
                    }),
                    stdin: Some(req.stdin.is_some()),
                    stdin_once: Some(req.stdin.is_some()),
                    ..Default::default()
                }],
                volumes,
                topology_spread_constraints: Some(vec![TopologySpreadConstraint {
                    max_skew: 1,
                    topology_key: "kubernetes.io/hostname".to_string(),
                    when_unsatisfiable: "ScheduleAnyway".to_string(),
                    label_selector: Some(LabelSelector {
                        match_labels: Some(labels),
                        ..Default::default()
                    }),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// True once the pod has left `Pending` (scheduled, whether or not it
    /// has started running yet).
    fn left_pending(pod: &Pod) -> bool {
        pod.status.as_ref().and_then(|s| s.phase.as_deref()).map(|p| p != "Pending").unwrap_or(false)
    }

    /// Terminal phase per spec §4.1: `Succeeded`/`Completed` → exit 0;
    /// `Failed`/`Unknown` → non-zero error.
    fn terminal_phase(pod: &Pod) -> Option<&str> {
        pod.status.as_ref().and_then(|s| s.phase.as_deref()).filter(|p| {
            matches!(*p, "Succeeded" | "Completed" | "Failed" | "Unknown")
        })
    }

    async fn wait_for_pod(&self, name: &str, timeout_seconds: u64) -> Result<Pod, RunnerError> {
        let api = self.pods();
        let start = Instant::now();

        // Bounded wait #1: scheduling.
        loop {
            let pod = api.get(name).await.map_err(|e| RunnerError::Wait(e.to_string()))?;
            if Self::left_pending(&pod) || Self::terminal_phase(&pod).is_some() {
                break;
            }
            if start.elapsed() >= SCHEDULING_BUDGET {
                return Err(RunnerError::Timeout { timeout_secs: SCHEDULING_BUDGET.as_secs() });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        // Bounded wait #2: completion.
        loop {
            let pod = api.get(name).await.map_err(|e| RunnerError::Wait(e.to_string()))?;
            if Self::terminal_phase(&pod).is_some() {
                return Ok(pod);
            }
            if start.elapsed() >= Duration::from_secs(timeout_seconds) {
                return Err(RunnerError::Timeout { timeout_secs: timeout_seconds });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn fetch_logs(&self, name: &str) -> Result<String, RunnerError> {
        self.pods()
            .logs(name, &LogParams::default())
            .await
            .map_err(|e| RunnerError::ReadLogs(e.to_string()))
    }
}

#[async_trait]
impl Runner for PodRunner {
    async fn run(&self, req: &RunRequest) -> Result<RunResult, RunnerError> {
        self.ensure_image(&req.image).await?;

        let name = format!("scanforge-scan-{}", Uuid::new_v4());
        let (image_name, _tag) = split_image_ref(&req.image);
        let tool = stable_tool_label(&image_name);
        let pod = self.build_pod(&name, req, &tool);

        self.pods()
            .create(&PostParams::default(), &pod)
            .await
            .map_err(|e| RunnerError::Create(e.to_string()))?;

        debug!(pod = %name, "submitted one-shot pod");

        let result = self.wait_for_pod(&name, req.timeout_seconds).await;

        let outcome = match result {
            Ok(pod) => {
                let phase = Self::terminal_phase(&pod).unwrap_or("Unknown");
                let exit_code = match phase {
                    "Succeeded" | "Completed" => 0,
                    _ => 1,
                };
                let stdout = self.fetch_logs(&name).await.unwrap_or_default();
                Ok(RunResult { stdout, stderr: String::new(), exit_code })
            }
            Err(err) => Err(err),
        };

        let _ = self.pods().delete(&name, &DeleteParams::default()).await;

        outcome
    }

    async fn ensure_image(&self, image: &str) -> Result<(), RunnerError> {
        // The cluster's kubelet/CRI pulls images on the node; this backend
        // only validates the reference shape up front.
        let (_name, _tag) = split_image_ref(image);
        Ok(())
    }

    async fn health(&self) -> Result<(), RunnerError> {
        self.client
            .apiserver_version()
            .await
            .map(|_| ())
            .map_err(|e| RunnerError::Transport(e.to_string()))
    }
}

/// Topology-spread label value: derived from the image name (stable across
/// concurrent runs of the same tool) so the spread constraint actually
/// spreads them, rather than each pod minting its own unique label (spec
/// §4.1: "label-scoped topology spread so multiple concurrent runs for the
/// same tool are scheduled across nodes").
pub fn stable_tool_label(image_name: &str) -> String {
    format!("scanforge-scan-{image_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_tool_label_is_deterministic() {
        assert_eq!(stable_tool_label("bandit"), stable_tool_label("bandit"));
        assert_ne!(stable_tool_label("bandit"), stable_tool_label("gosec"));
    }
}
