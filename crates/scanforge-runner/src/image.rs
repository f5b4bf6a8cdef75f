//! Image reference parsing (spec §4.1: "`image` must be in `name:tag` form
//! and the last `:` is the tag delimiter (registry hosts with ports are
//! supported)").

/// Split an `image:tag` reference into `(name, tag)`. If the text after the
/// last `:` contains a `/`, that colon belongs to a `host:port` registry
/// prefix rather than a tag delimiter, and the image has no explicit tag
/// (defaults to `latest`).
pub fn split_image_ref(image_ref: &str) -> (String, String) {
    match image_ref.rfind(':') {
        Some(idx) if !image_ref[idx + 1..].contains('/') && idx + 1 < image_ref.len() => {
            (image_ref[..idx].to_string(), image_ref[idx + 1..].to_string())
        }
        _ => (image_ref.to_string(), "latest".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_simple_name_and_tag() {
        assert_eq!(
            split_image_ref("scanforge/bandit:1.7"),
            ("scanforge/bandit".to_string(), "1.7".to_string())
        );
    }

    #[test]
    fn defaults_to_latest_when_no_tag() {
        assert_eq!(
            split_image_ref("scanforge/bandit"),
            ("scanforge/bandit".to_string(), "latest".to_string())
        );
    }

    #[test]
    fn registry_host_with_port_is_not_mistaken_for_tag() {
        assert_eq!(
            split_image_ref("registry.internal:5000/scanforge/bandit"),
            ("registry.internal:5000/scanforge/bandit".to_string(), "latest".to_string())
        );
    }

    #[test]
    fn registry_host_with_port_and_explicit_tag() {
        assert_eq!(
            split_image_ref("registry.internal:5000/scanforge/bandit:1.7"),
            ("registry.internal:5000/scanforge/bandit".to_string(), "1.7".to_string())
        );
    }
}
