//! Static configuration: the signal registry.
//!
//! The registry maps each tracked signal id to everything the pipeline needs
//! to interpret that source's output — the source-specific extraction
//! pattern, the threshold expression, the contextual rule, the linked
//! hypothesis — plus the store's retention window. It is loaded once at
//! startup (JSON file or the built-in table) and passed through every stage;
//! nothing in the pipeline reads module-level mutable state.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::context::{ContextRule, RuleOp};

/// Default observation retention window, in days.
pub const DEFAULT_RETENTION_DAYS: u32 = 90;

/// Errors loading or compiling the registry.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read registry file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse registry JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid extraction pattern for {id}: {source}")]
    Pattern {
        id: String,
        #[source]
        source: regex::Error,
    },
}

/// A source-specific extraction pattern; the first capture group is the
/// numeric token.
#[derive(Debug, Clone)]
pub struct SourcePattern {
    pub regex: Regex,
    /// When set, a comma in the captured token is a decimal point rather
    /// than a thousands separator.
    pub decimal_comma: bool,
}

/// Monitoring priority of a signal, used for ordering in stored rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Everything the pipeline knows about one tracked signal.
#[derive(Debug, Clone)]
pub struct SignalSpec {
    pub id: String,
    pub label: String,
    pub domain: String,
    pub priority: Priority,
    pub unit: Option<String>,
    /// Threshold expression for the comparator, e.g. `"<20"` or `">100k"`.
    pub threshold: Option<String>,
    pub pattern: Option<SourcePattern>,
    pub context_rule: Option<ContextRule>,
    /// Hypothesis this signal feeds, for the stored annotation.
    pub hypothesis: Option<String>,
}

/// The compiled signal registry.
#[derive(Debug, Clone)]
pub struct SignalRegistry {
    signals: HashMap<String, SignalSpec>,
    pub retention_days: u32,
}

impl SignalRegistry {
    /// Load and compile a registry from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let file: RegistryFile = serde_json::from_str(&content)?;
        Self::compile(file)
    }

    fn compile(file: RegistryFile) -> Result<Self, ConfigError> {
        let mut signals = HashMap::with_capacity(file.signals.len());
        for entry in file.signals {
            let pattern = match entry.pattern {
                Some(p) => Some(SourcePattern {
                    regex: Regex::new(&p.regex).map_err(|source| ConfigError::Pattern {
                        id: entry.id.clone(),
                        source,
                    })?,
                    decimal_comma: p.decimal_comma,
                }),
                None => None,
            };
            let context_rule = entry.context.map(|c| ContextRule {
                op: c.op,
                cutoff: c.cutoff,
                when_true: c.when_true,
                when_false: c.when_false,
            });
            signals.insert(
                entry.id.clone(),
                SignalSpec {
                    id: entry.id,
                    label: entry.label,
                    domain: entry.domain,
                    priority: entry.priority,
                    unit: entry.unit,
                    threshold: entry.threshold,
                    pattern,
                    context_rule,
                    hypothesis: entry.hypothesis,
                },
            );
        }
        Ok(Self {
            signals,
            retention_days: file.retention_days,
        })
    }

    pub fn get(&self, id: &str) -> Option<&SignalSpec> {
        self.signals.get(id)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SignalSpec> {
        self.signals.values()
    }

    /// The built-in registry covering the canonical tracked signals: every
    /// hypothesis input, the battery-metals matrix, and the high-priority
    /// alert thresholds. Deployments with a full source fleet load a JSON
    /// registry instead.
    pub fn builtin() -> Self {
        let mut signals = HashMap::new();
        let mut add = |spec: SignalSpec| {
            signals.insert(spec.id.clone(), spec);
        };

        let spec = |id: &str,
                    label: &str,
                    domain: &str,
                    priority: Priority,
                    unit: Option<&str>,
                    threshold: Option<&str>,
                    pattern: Option<&str>,
                    context_rule: Option<ContextRule>,
                    hypothesis: Option<&str>|
         -> SignalSpec {
            SignalSpec {
                id: id.to_string(),
                label: label.to_string(),
                domain: domain.to_string(),
                priority,
                unit: unit.map(str::to_string),
                threshold: threshold.map(str::to_string),
                // Built-in patterns are compile-checked by tests; unwrap is
                // unreachable for a well-formed table.
                pattern: pattern.map(|p| SourcePattern {
                    regex: Regex::new(p).expect("built-in pattern"),
                    decimal_comma: false,
                }),
                context_rule,
                hypothesis: hypothesis.map(str::to_string),
            }
        };

        use Priority::*;
        use RuleOp::*;

        add(spec(
            "R00", "Zero-day CVEs", "cyber", High, None, Some(">15"),
            Some(r"R00=(\d+)"), None, Some("H3_CYBER_SUPPLY"),
        ));
        add(spec(
            "R01", "PBOC balance sheet", "finance", High, Some("T CNY"), None,
            Some(r"PBOC=(\d+\.?\d*)"),
            Some(ContextRule::new(Above, 6.0, "PBOC stable", "PBOC low")),
            Some("H6_CN_AFRICA"),
        ));
        add(spec(
            "R02", "Arms transfers (SIPRI TIV)", "defense", Medium, None, Some(">4000"),
            Some(r"TIV=(\d+)"), None, Some("H2_NATO"),
        ));
        add(spec(
            "R06", "Napoleon gold coin", "finance", Medium, Some("€"), None,
            Some(r"Napoléon=([\d.]+)€"),
            Some(ContextRule::new(Above, 900.0, "napoleon ok", "napoleon low")),
            None,
        ));
        add(spec(
            "R09", "Brent crude", "energy", Medium, Some("$/bbl"), None,
            Some(r"Brent=\$(\d+\.?\d*)"), None, None,
        ));
        add(spec(
            "R10", "CBOE VIX", "finance", Medium, None, Some(">30"),
            Some(r"VIX=([\d.]+)"), None, None,
        ));
        add(spec(
            "R11", "EU gas storage", "energy", High, Some("%"), Some("<20"),
            Some(r"R11=(\d+\.?\d*)%"),
            Some(ContextRule::new(Below, 20.0, "critical", "stable")),
            Some("H1_P4"),
        ));
        add(spec(
            "R12", "Fear & Greed index", "finance", Medium, None, None,
            Some(r"FGI=(\d+)"),
            Some(ContextRule::new(Below, 35.0, "fear", "neutral")),
            Some("H8_CRYPTO"),
        ));
        add(spec(
            "R15", "Bitcoin", "finance", Medium, Some("$"), None,
            Some(r"BTC=\$([\d,]+)"),
            Some(ContextRule::new(Above, 85_000.0, "euphoria", "normal")),
            Some("H8_CRYPTO"),
        ));
        add(spec(
            "R24", "TTF gas front-month", "energy", High, Some("€/MWh"), Some(">50"),
            Some(r"TTF=€(\d+\.?\d*)"),
            Some(ContextRule::new(Below, 40.0, "low", "elevated")),
            Some("H1_P4"),
        ));
        add(spec(
            "R25", "Venezuela crude to China", "energy", Low, Some("kbpd"), None,
            Some(r"VZ→Chine=(\d+)"),
            Some(ContextRule::new(Above, 75.0, "CNPC dominant", "CNPC low")),
            None,
        ));
        add(spec(
            "R32", "GDELT conflict events", "geopolitics", Medium, None, None,
            Some(r"R32=(\d+)"), None, Some("H5_GDELT"),
        ));
        add(spec(
            "R56", "BTC MVRV ratio", "crypto", Medium, None, None,
            Some(r"MVRV=([\d.]+)"),
            Some(ContextRule::new(Below, 3.5, "accumulation", "distribution")),
            Some("H8_CRYPTO"),
        ));
        add(spec(
            "R57", "BTC NUPL", "crypto", Medium, None, None,
            Some(r"NUPL=([\d.]+)"),
            Some(ContextRule::new(Below, 0.75, "belief", "doubt")),
            Some("H8_CRYPTO"),
        ));
        add(spec(
            "R65", "Silver", "commodities", Medium, Some("$/oz"), None,
            Some(r"Ag=\$(\d+\.\d+)"),
            Some(ContextRule::new(Above, 30.0, "silver bull", "silver low")),
            Some("H3_CYBER_SUPPLY"),
        ));
        add(spec(
            "R66", "Lithium carbonate", "commodities", Medium, Some("CNY/t"), None,
            Some(r"Li=([\d,]+)"), None, Some("H3_CYBER_SUPPLY"),
        ));
        add(spec(
            "R67", "Nickel", "commodities", Medium, Some("$/t"), None,
            Some(r"Ni=\$(\d+)"),
            Some(ContextRule::new(Above, 17_000.0, "nickel bull", "nickel low")),
            Some("H3_CYBER_SUPPLY"),
        ));
        add(spec(
            "R68", "Cobalt", "commodities", Medium, Some("$/lb"), None,
            Some(r"Co=\$(\d+)"),
            Some(ContextRule::new(Above, 10.0, "cobalt bull", "cobalt low")),
            Some("H3_CYBER_SUPPLY"),
        ));
        add(spec(
            "R69", "Graphite", "commodities", Medium, Some("$/t"), None,
            Some(r"Graphite=\$(\d+)"),
            Some(ContextRule::new(Above, 600.0, "graphite bull", "graphite low")),
            Some("H3_CYBER_SUPPLY"),
        ));
        add(spec(
            "R70", "Rare earths", "commodities", Medium, Some("$/kg"), None,
            Some(r"RE=(\d+)"),
            Some(ContextRule::new(Above, 120.0, "REO bull", "REO low")),
            Some("H3_CYBER_SUPPLY"),
        ));
        add(spec(
            "R71", "USD1 stablecoin cap", "crypto", Medium, Some("B$"), None,
            Some(r"USD1=\$(\d+\.?\d*)"),
            Some(ContextRule::new(AtLeast, 3.0, "USD1 bull", "USD1 low")),
            Some("H9_TECH_WAR"),
        ));
        add(spec(
            "R72", "USDC dominance", "crypto", Low, Some("%"), None, None,
            Some(ContextRule::new(AtLeast, 50.0, "USDC dominant", "USDC low")),
            Some("H9_TECH_WAR"),
        ));
        add(spec(
            "R81", "Indicator-of-compromise volume", "cyber", High, None, Some(">500"),
            Some(r"R81=(\d+)"), None, Some("H3_CYBER_SUPPLY"),
        ));
        add(spec(
            "R91", "Suspicious netflow", "cyber", High, None, Some(">100k"),
            Some(r"R91=([\d,]+)"),
            Some(ContextRule::new(Below, 100_000.0, "low", "very high")),
            None,
        ));
        add(spec(
            "R95", "New adversary TTPs", "cyber", Medium, None, None,
            Some(r"R95=(\d+)"), None, Some("H9_TECH_WAR"),
        ));

        Self {
            signals,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

fn default_retention() -> u32 {
    DEFAULT_RETENTION_DAYS
}

// JSON file model, compiled into `SignalRegistry` at load.

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default = "default_retention")]
    retention_days: u32,
    signals: Vec<SignalEntry>,
}

#[derive(Debug, Deserialize)]
struct SignalEntry {
    id: String,
    label: String,
    #[serde(default)]
    domain: String,
    priority: Priority,
    unit: Option<String>,
    threshold: Option<String>,
    pattern: Option<PatternEntry>,
    context: Option<ContextEntry>,
    hypothesis: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PatternEntry {
    regex: String,
    #[serde(default)]
    decimal_comma: bool,
}

#[derive(Debug, Deserialize)]
struct ContextEntry {
    op: RuleOp,
    cutoff: f64,
    when_true: String,
    when_false: String,
}
