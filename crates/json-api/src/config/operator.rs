//! Operator Config

use clap::Args;

/// Operator route settings.
#[derive(Debug, Args)]
pub struct OperatorConfig {
    /// Bearer token accepted on catalog administration and fulfilment
    /// routes; those routes reject every request when unset
    #[arg(long, env = "OPERATOR_TOKEN", hide_env_values = true)]
    pub operator_token: Option<String>,
}
