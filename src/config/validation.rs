//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks on detector and stream values.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

use super::SentinelConfig;

/// Largest window the detector accepts.
pub const MAX_WINDOW_SIZE: usize = 1 << 20;

/// Trigger intervals below this flush stdin so often that batches rarely fill a window.
pub const MIN_SENSIBLE_TRIGGER_INTERVAL_MS: u64 = 50;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " — did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for SentinelConfig.
///
/// Maintained by hand to match sentinel_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [detector]
        "detector",
        "detector.window_size",
        "detector.change_threshold_percent",
        "detector.window_selection",
        "detector.spectrum_component",
        // [stream]
        "stream",
        "stream.trigger_interval_ms",
        "stream.replay_batch_size",
        "stream.replay_delay_ms",
        // [output]
        "output",
        "output.format",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Edit distance between two strings, counted in chars.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let b_len = b_chars.len();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the lexicographically smaller key so suggestions are stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// Never fails: malformed TOML yields no warnings here and is reported by
/// the serde pass instead.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    let mut warnings: Vec<ValidationWarning> = walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect();
    warnings.sort_by(|a, b| a.field.cmp(&b.field));
    warnings
}

// ============================================================================
// Range Validation
// ============================================================================

/// Validate value ranges on a parsed SentinelConfig.
///
/// Returns (errors, warnings): errors must prevent startup; warnings are
/// settings that work but probably do not do what the operator wants.
pub fn validate_ranges(config: &SentinelConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let d = &config.detector;
    let s = &config.stream;

    if d.window_size > MAX_WINDOW_SIZE {
        errors.push(format!(
            "detector.window_size = {} exceeds maximum of {}",
            d.window_size, MAX_WINDOW_SIZE
        ));
    }

    // change_percent is bounded by 100, so the strict comparison can never pass
    if d.change_threshold_percent.is_finite() && d.change_threshold_percent >= 100.0 {
        warnings.push(ValidationWarning {
            field: "detector.change_threshold_percent".to_string(),
            message: format!(
                "change_threshold_percent = {:.2} is >= 100, no alert can ever fire",
                d.change_threshold_percent
            ),
            suggestion: None,
        });
    }

    if s.replay_batch_size > 0 && d.window_size > s.replay_batch_size {
        warnings.push(ValidationWarning {
            field: "stream.replay_batch_size".to_string(),
            message: format!(
                "replay_batch_size = {} is smaller than window_size = {}, every replayed batch will be skipped",
                s.replay_batch_size, d.window_size
            ),
            suggestion: None,
        });
    }

    if s.trigger_interval_ms > 0 && s.trigger_interval_ms < MIN_SENSIBLE_TRIGGER_INTERVAL_MS {
        warnings.push(ValidationWarning {
            field: "stream.trigger_interval_ms".to_string(),
            message: format!(
                "trigger_interval_ms = {} is very short, stdin batches may never fill a window",
                s.trigger_interval_ms
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("window", "window"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("thresold", "threshold"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [detector]
            window_size = 64
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"detector".to_string()));
        assert!(keys.contains(&"detector.window_size".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[detector]
window_sise = 64
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "detector.window_sise");
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("detector.window_size")
        );
        assert!(warnings[0].to_string().contains("did you mean"));
    }

    #[test]
    fn test_all_valid_keys_produce_zero_warnings() {
        let toml_str = r#"
[detector]
window_size = 600
change_threshold_percent = 8.0
window_selection = "cap_then_sort"
spectrum_component = "real"

[stream]
trigger_interval_ms = 5000
replay_batch_size = 600
replay_delay_ms = 1000

[output]
format = "text"
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert!(warnings.is_empty(), "Expected 0 warnings, got: {warnings:?}");
    }

    #[test]
    fn test_unknown_section_produces_warning() {
        let toml_str = r#"
[metrics]
port = 9000
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert!(warnings.iter().any(|w| w.field == "metrics"));
        assert!(warnings.iter().any(|w| w.field == "metrics.port"));
    }

    #[test]
    fn test_malformed_toml_yields_no_key_warnings() {
        assert!(validate_unknown_keys("[detector\nwindow_size = ").is_empty());
    }

    #[test]
    fn test_suggest_correction_no_match_for_garbage() {
        let known = known_config_keys();
        assert!(suggest_correction("completely_unrelated_garbage_key_xyz", &known).is_none());
    }

    #[test]
    fn test_ranges_defaults_clean() {
        let (errors, warnings) = validate_ranges(&SentinelConfig::default());
        assert!(errors.is_empty(), "{errors:?}");
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    #[test]
    fn test_threshold_at_hundred_warns() {
        let mut config = SentinelConfig::default();
        config.detector.change_threshold_percent = 100.0;
        let (errors, warnings) = validate_ranges(&config);
        assert!(errors.is_empty());
        assert!(warnings
            .iter()
            .any(|w| w.field == "detector.change_threshold_percent"));
    }

    #[test]
    fn test_window_larger_than_replay_batch_warns() {
        let mut config = SentinelConfig::default();
        config.detector.window_size = 1024;
        let (_, warnings) = validate_ranges(&config);
        assert!(warnings.iter().any(|w| w.field == "stream.replay_batch_size"));
    }

    #[test]
    fn test_huge_window_is_error() {
        let mut config = SentinelConfig::default();
        config.detector.window_size = MAX_WINDOW_SIZE + 1;
        config.stream.replay_batch_size = MAX_WINDOW_SIZE + 1;
        let (errors, _) = validate_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("window_size")));
    }
}
