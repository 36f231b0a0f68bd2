//! Conversion from Kubernetes API objects to workload specs
//!
//! Absent fields map to their least alarming value so partially populated
//! objects never fail conversion.

use crate::models::{
    CloudVolumeType, ContainerSecurityContext, ContainerSpec, PodSecurityContext, VolumeSpec,
    WorkloadSpec,
};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Container, PodSpec, Volume};
use kube::ResourceExt;

/// Build a workload spec from a deployment's pod template
pub fn workload_from_deployment(deployment: &Deployment) -> WorkloadSpec {
    let pod = deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.template.spec.as_ref());

    let mut workload = WorkloadSpec {
        name: deployment.name_any(),
        creation_timestamp: deployment.creation_timestamp().map(|t| t.0),
        ..Default::default()
    };

    if let Some(pod) = pod {
        apply_pod_spec(&mut workload, pod);
    }

    workload
}

fn apply_pod_spec(workload: &mut WorkloadSpec, pod: &PodSpec) {
    workload.security_context = pod.security_context.as_ref().map(|ctx| PodSecurityContext {
        run_as_non_root: ctx.run_as_non_root,
        privileged: None,
    });
    workload.host_network = pod.host_network.unwrap_or(false);
    workload.host_pid = pod.host_pid.unwrap_or(false);
    workload.host_ipc = pod.host_ipc.unwrap_or(false);
    workload.containers = pod.containers.iter().map(container_from_k8s).collect();
    workload.volumes = pod
        .volumes
        .iter()
        .flatten()
        .map(volume_from_k8s)
        .collect();
}

/// Build a container spec from a pod template container
pub fn container_from_k8s(container: &Container) -> ContainerSpec {
    let security_context = container
        .security_context
        .as_ref()
        .map(|ctx| ContainerSecurityContext {
            privileged: ctx.privileged,
            run_as_non_root: ctx.run_as_non_root,
            read_only_root_filesystem: ctx.read_only_root_filesystem,
            capabilities_added: ctx
                .capabilities
                .as_ref()
                .and_then(|caps| caps.add.clone())
                .unwrap_or_default()
                .into_iter()
                .collect(),
        });

    let host_ports = container
        .ports
        .iter()
        .flatten()
        .filter_map(|port| port.host_port)
        .filter_map(|port| u16::try_from(port).ok())
        .filter(|port| *port > 0)
        .collect();

    let has_resource_limits = container
        .resources
        .as_ref()
        .and_then(|res| res.limits.as_ref())
        .map(|limits| !limits.is_empty())
        .unwrap_or(false);

    ContainerSpec {
        name: container.name.clone(),
        security_context,
        host_ports,
        image: container.image.clone(),
        image_pull_policy: container.image_pull_policy.clone(),
        has_resource_limits,
    }
}

fn volume_from_k8s(volume: &Volume) -> VolumeSpec {
    let cloud_provider_volume_type = if volume.gce_persistent_disk.is_some() {
        Some(CloudVolumeType::GcePersistentDisk)
    } else if volume.aws_elastic_block_store.is_some() {
        Some(CloudVolumeType::AwsElasticBlockStore)
    } else if volume.azure_disk.is_some() {
        Some(CloudVolumeType::AzureDisk)
    } else if volume.portworx_volume.is_some() {
        Some(CloudVolumeType::PortworxVolume)
    } else if volume.scale_io.is_some() {
        Some(CloudVolumeType::ScaleIo)
    } else {
        None
    };

    VolumeSpec {
        name: volume.name.clone(),
        host_path: volume.host_path.as_ref().map(|hp| hp.path.clone()),
        cloud_provider_volume_type,
    }
}
