//! Shell-intrinsic methods, answered without touching the provider.

use serde_json::{Value, json};

use dappshell_core::Envelope;

use super::dispatcher::Broker;
use super::types::BrokerError;
use crate::permission::is_truthy;

/// Methods the broker implements itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intrinsic {
    /// `[displayAll]`: all dapps when truthy, otherwise only visible ones.
    GetApps,
    /// Every method that needs approval.
    GetFilteredMethods,
    /// The full permission table.
    GetMethodPermissions,
    /// Issue a session token for the sender.
    RequestNewToken,
    /// `[appId, visible]`
    SetAppVisibility,
    /// `[{"<method>:<appId>": flag, ...}]`
    SetMethodPermissions,
}

impl Intrinsic {
    pub fn from_method(method: &str) -> Option<Self> {
        match method {
            "shell_getApps" => Some(Self::GetApps),
            "shell_getFilteredMethods" => Some(Self::GetFilteredMethods),
            "shell_getMethodPermissions" => Some(Self::GetMethodPermissions),
            dappshell_core::envelope::REQUEST_NEW_TOKEN => Some(Self::RequestNewToken),
            "shell_setAppVisibility" => Some(Self::SetAppVisibility),
            "shell_setMethodPermissions" => Some(Self::SetMethodPermissions),
            _ => None,
        }
    }
}

impl Broker {
    pub(super) async fn run_intrinsic(
        &self,
        intrinsic: Intrinsic,
        envelope: &Envelope,
        params: &[Value],
    ) -> Result<Value, BrokerError> {
        match intrinsic {
            Intrinsic::GetApps => {
                let display_all = params.first().is_some_and(is_truthy);
                let apps = if display_all {
                    self.dapps.all_apps().await
                } else {
                    self.dapps.visible_apps().await
                };
                Ok(serde_json::to_value(apps)?)
            }
            Intrinsic::GetFilteredMethods => Ok(json!(self.classifier.sensitive_methods())),
            Intrinsic::GetMethodPermissions => Ok(json!(self.permissions.snapshot().await)),
            Intrinsic::RequestNewToken => Ok(json!(self.tokens.issue(&envelope.from).await)),
            Intrinsic::SetAppVisibility => {
                let app_id = params
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| BrokerError::InvalidParams("expected [appId, visible]".into()))?;
                let visible = params.get(1).is_some_and(is_truthy);
                Ok(json!(self.dapps.set_visibility(app_id, visible).await))
            }
            Intrinsic::SetMethodPermissions => {
                let entries = params
                    .first()
                    .and_then(Value::as_object)
                    .ok_or_else(|| {
                        BrokerError::InvalidParams("expected a permission map".into())
                    })?;
                Ok(json!(self.permissions.set_bulk(entries).await))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_shell_methods() {
        assert_eq!(
            Intrinsic::from_method("shell_requestNewToken"),
            Some(Intrinsic::RequestNewToken)
        );
        assert_eq!(
            Intrinsic::from_method("shell_setMethodPermissions"),
            Some(Intrinsic::SetMethodPermissions)
        );
        assert_eq!(Intrinsic::from_method("eth_accounts"), None);
        assert_eq!(Intrinsic::from_method("shell_unknown"), None);
    }
}
