use std::collections::HashMap;
use std::path::PathBuf;

use opentelemetry::KeyValue;
use opentelemetry_sdk::resource::{EnvResourceDetector, ResourceDetector};
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource::{
    CONTAINER_ID, HOST_ARCH, HOST_NAME, SERVICE_NAME, SERVICE_VERSION,
};

/// Build the shared identity [`Resource`]: service name and version, the
/// caller's extra attributes, plus environment-, host-, and
/// container-derived attributes.
///
/// The result is immutable and cheap to clone into every provider.
pub(crate) fn build_resource(
    service_name: &str,
    service_version: &str,
    attributes: &HashMap<String, String>,
) -> Resource {
    let detectors: [Box<dyn ResourceDetector>; 3] = [
        Box::new(EnvResourceDetector::new()),
        Box::new(HostDetector),
        Box::new(ContainerDetector::default()),
    ];

    let mut kvs: Vec<KeyValue> = Vec::with_capacity(attributes.len() + 2);
    kvs.push(KeyValue::new(SERVICE_NAME, service_name.to_owned()));
    kvs.push(KeyValue::new(SERVICE_VERSION, service_version.to_owned()));
    for (key, value) in attributes {
        kvs.push(KeyValue::new(key.clone(), value.clone()));
    }

    Resource::builder()
        .with_detectors(&detectors)
        .with_attributes(kvs)
        .build()
}

/// Detects `host.name` and `host.arch` for the running machine.
#[derive(Debug, Default)]
struct HostDetector;

impl ResourceDetector for HostDetector {
    fn detect(&self) -> Resource {
        let mut attributes = vec![KeyValue::new(HOST_ARCH, std::env::consts::ARCH)];
        if let Some(name) = hostname() {
            attributes.push(KeyValue::new(HOST_NAME, name));
        }
        Resource::builder_empty().with_attributes(attributes).build()
    }
}

fn hostname() -> Option<String> {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|name| !name.is_empty())
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|contents| contents.trim().to_owned())
                .filter(|name| !name.is_empty())
        })
}

/// Detects `container.id` from the process cgroup file when running inside
/// a container. Outside a container it contributes nothing.
#[derive(Debug)]
struct ContainerDetector {
    cgroup_path: PathBuf,
}

impl Default for ContainerDetector {
    fn default() -> Self {
        Self {
            cgroup_path: PathBuf::from("/proc/self/cgroup"),
        }
    }
}

impl ResourceDetector for ContainerDetector {
    fn detect(&self) -> Resource {
        let container_id = std::fs::read_to_string(&self.cgroup_path)
            .ok()
            .and_then(|contents| container_id_from_cgroup(&contents));

        match container_id {
            Some(id) => Resource::builder_empty()
                .with_attributes([KeyValue::new(CONTAINER_ID, id)])
                .build(),
            None => Resource::builder_empty().build(),
        }
    }
}

/// Extract a container id from `/proc/self/cgroup` contents.
///
/// Each line reads `hierarchy:controllers:path`; container runtimes place a
/// 64-char hex id in the path's last segment (`/docker/<id>`,
/// `…/docker-<id>.scope`).
fn container_id_from_cgroup(contents: &str) -> Option<String> {
    contents.lines().find_map(|line| {
        let path = line.split(':').nth(2)?;
        let segment = path.rsplit('/').next()?;
        let candidate = segment.trim_end_matches(".scope");
        let candidate = candidate.rsplit('-').next()?;
        if candidate.len() == 64 && candidate.bytes().all(|b| b.is_ascii_hexdigit()) {
            Some(candidate.to_owned())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use opentelemetry::{Key, Value};

    use super::*;

    fn string_value(resource: &Resource, key: &'static str) -> Option<String> {
        resource.get(&Key::from_static_str(key)).map(|value| match value {
            Value::String(s) => s.to_string(),
            other => other.to_string(),
        })
    }

    #[test]
    fn resource_carries_service_identity_and_extra_attributes() {
        let attributes = HashMap::from([(
            "deployment.environment".to_owned(),
            "staging".to_owned(),
        )]);

        let resource = build_resource("test-service", "1.2.3", &attributes);

        assert_eq!(
            string_value(&resource, SERVICE_NAME),
            Some("test-service".to_owned())
        );
        assert_eq!(
            string_value(&resource, SERVICE_VERSION),
            Some("1.2.3".to_owned())
        );
        assert_eq!(
            string_value(&resource, "deployment.environment"),
            Some("staging".to_owned())
        );
    }

    #[test]
    fn host_detector_always_reports_arch() {
        let resource = HostDetector.detect();

        assert_eq!(
            string_value(&resource, HOST_ARCH),
            Some(std::env::consts::ARCH.to_owned())
        );
    }

    #[test]
    fn container_id_parsed_from_docker_cgroup() {
        let id = "a".repeat(64);
        let contents = format!("12:pids:/docker/{id}\n11:cpu,cpuacct:/docker/{id}\n");

        assert_eq!(container_id_from_cgroup(&contents), Some(id));
    }

    #[test]
    fn container_id_parsed_from_systemd_scope() {
        let id = "0123456789abcdef".repeat(4);
        let contents = format!("0::/system.slice/docker-{id}.scope\n");

        assert_eq!(container_id_from_cgroup(&contents), Some(id));
    }

    #[test]
    fn no_container_id_outside_a_container() {
        let contents = "0::/init.scope\n1:name=systemd:/user.slice/user-1000.slice\n";

        assert_eq!(container_id_from_cgroup(contents), None);
    }

    #[test]
    fn container_detector_tolerates_missing_cgroup_file() {
        let detector = ContainerDetector {
            cgroup_path: PathBuf::from("/definitely/not/a/real/cgroup"),
        };

        let resource = detector.detect();

        assert!(string_value(&resource, CONTAINER_ID).is_none());
    }
}
