//! `bundleprep wrap`: show what a conversion filter produces.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use crate::templating::{ConversionContext, ValueType};

/// Wrap a value into a typed token and unwrap it again.
#[derive(Args, Debug)]
pub struct WrapCommand {
    /// Target type: int, float, bool or nullable
    #[arg(long = "type", value_name = "TYPE")]
    pub value_type: ValueType,

    /// Value to wrap, parsed as a YAML scalar
    #[arg(value_name = "VALUE", allow_hyphen_values = true)]
    pub value: String,
}

impl WrapCommand {
    /// Print the token and the value it unwraps to.
    ///
    /// # Errors
    ///
    /// Fails if the value cannot be converted to the requested type.
    pub fn execute(self) -> Result<()> {
        let (token, value) = self.round_trip(&ConversionContext::new())?;
        println!("token: {token}");
        println!("value: {}", serde_json::to_string(&value)?);
        Ok(())
    }

    fn round_trip(&self, ctx: &ConversionContext) -> Result<(String, Value)> {
        let input: Value = serde_yaml::from_str(&self.value)
            .with_context(|| format!("Invalid value '{}'", self.value))?;
        let token = ctx.wrap(self.value_type, &input)?;
        let value = ctx.unwrap(token.as_str())?;
        Ok((token.into_string(), value))
    }
}
