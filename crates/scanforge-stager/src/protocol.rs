//! The two extraction strategies the Runner executes against a pre-built
//! unzip-capable image (spec §4.2). [`crate::stager::ArtifactStager`] wires
//! [`stream_strategy_command`] into the `RunRequest` it hands to the
//! configured `Runner`; [`shared_volume_fallback_command`] documents the
//! second strategy spec §4.2 names for a `Runner` backend that cannot accept
//! stdin. Kept here as pure string-building functions, independent of any
//! container runtime, so the protocol itself has direct unit coverage
//! (spec §8: "round-trip and idempotence laws").

/// Strategy (a): stream the archive into the container's stdin as
/// `.incoming-<rid>.zip`, then extract from it.
pub fn stream_strategy_command(rid: &str) -> String {
    format!(
        "cat > /workspace/.incoming-{rid}.zip && \
         cd /workspace && unzip -o .incoming-{rid}.zip -d {rid} && \
         rm -f .incoming-{rid}.zip"
    )
}

/// Strategy (b): wait for `<rid>.zip` (or a non-empty `.incoming-*`) to
/// appear on the shared volume, then extract. Bounded: an initial 2s sleep,
/// then 60 probes at 0.5s each (spec §4.2).
pub fn shared_volume_fallback_command(rid: &str) -> String {
    format!(
        "cd /workspace && sleep 2 && \
         for i in $(seq 1 60); do \
           if [ -s {rid}.zip ] || ls .incoming-* >/dev/null 2>&1; then break; fi; \
           sleep 0.5; \
         done && \
         unzip -o {rid}.zip -d {rid}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_strategy_names_the_incoming_archive_by_rid() {
        let cmd = stream_strategy_command("zz1");
        assert!(cmd.contains(".incoming-zz1.zip"));
        assert!(cmd.contains("-d zz1"));
    }

    #[test]
    fn fallback_strategy_probes_sixty_times_at_half_second_intervals() {
        let cmd = shared_volume_fallback_command("zz1");
        assert!(cmd.contains("seq 1 60"));
        assert!(cmd.contains("sleep 0.5"));
        assert!(cmd.contains("sleep 2"));
    }
}
