use crate::{env_parse, ConfigError, FromEnv};

/// Tuning knobs for the built-in audit rules.
#[derive(Clone, Debug, PartialEq)]
pub struct AuditConfig {
    /// Peak CPU utilization (0.0..=1.0) below which a SQL instance counts as over-provisioned
    pub sql_peak_cpu_threshold: f64,
    /// How far back metric time series are read
    pub lookback_days: u32,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            sql_peak_cpu_threshold: 0.5,
            lookback_days: 7,
        }
    }
}

impl FromEnv for AuditConfig {
    /// - AUDIT_SQL_PEAK_CPU_THRESHOLD: defaults to 0.5, must be in (0, 1]
    /// - AUDIT_LOOKBACK_DAYS: defaults to 7, must be positive
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let sql_peak_cpu_threshold: f64 =
            env_parse("AUDIT_SQL_PEAK_CPU_THRESHOLD", defaults.sql_peak_cpu_threshold)?;
        if !(sql_peak_cpu_threshold > 0.0 && sql_peak_cpu_threshold <= 1.0) {
            return Err(ConfigError::InvalidValue {
                key: "AUDIT_SQL_PEAK_CPU_THRESHOLD".to_string(),
                details: format!("{} is outside (0, 1]", sql_peak_cpu_threshold),
            });
        }

        let lookback_days: u32 = env_parse("AUDIT_LOOKBACK_DAYS", defaults.lookback_days)?;
        if lookback_days == 0 {
            return Err(ConfigError::InvalidValue {
                key: "AUDIT_LOOKBACK_DAYS".to_string(),
                details: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            sql_peak_cpu_threshold,
            lookback_days,
        })
    }
}
