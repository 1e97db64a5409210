//! Method sections.
//!
//! Groups sensitive RPC methods into named sections. A call to a method in
//! any section needs the user's approval; approving a whole section grants
//! every method in it at once. Methods outside all sections are never
//! queued.

use serde::{Deserialize, Serialize};

/// A named group of methods sharing one approval decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSection {
    pub name: String,
    pub methods: Vec<String>,
}

impl MethodSection {
    pub fn new(name: &str, methods: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            methods: methods.iter().map(|m| (*m).to_string()).collect(),
        }
    }

    pub fn contains(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m == method)
    }
}

/// Lookup table from method name to its section.
#[derive(Debug, Clone)]
pub struct MethodClassifier {
    sections: Vec<MethodSection>,
}

impl Default for MethodClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodClassifier {
    /// Create a classifier with the built-in sections.
    pub fn new() -> Self {
        Self {
            sections: default_sections(),
        }
    }

    /// Create a classifier with custom sections.
    pub const fn with_sections(sections: Vec<MethodSection>) -> Self {
        Self { sections }
    }

    /// Section containing `method`, if any.
    ///
    /// This is the only lookup: both the "needs approval" check and the
    /// "approve siblings together" expansion go through it.
    pub fn section_of(&self, method: &str) -> Option<&MethodSection> {
        self.sections.iter().find(|s| s.contains(method))
    }

    pub fn is_sensitive(&self, method: &str) -> bool {
        self.section_of(method).is_some()
    }

    /// Every method of every section, in table order.
    pub fn sensitive_methods(&self) -> Vec<&str> {
        self.sections
            .iter()
            .flat_map(|s| s.methods.iter().map(String::as_str))
            .collect()
    }

    pub fn sections(&self) -> &[MethodSection] {
        &self.sections
    }
}

fn default_sections() -> Vec<MethodSection> {
    vec![
        MethodSection::new(
            "accounts",
            &[
                "eth_accounts",
                "eth_coinbase",
                "parity_accountsInfo",
                "parity_allAccountsInfo",
                "parity_defaultAccount",
                "parity_hardwareAccountsInfo",
            ],
        ),
        MethodSection::new(
            "accountsCreate",
            &[
                "parity_generateSecretPhrase",
                "parity_newAccountFromPhrase",
                "parity_newAccountFromSecret",
                "parity_newAccountFromWallet",
                "parity_phraseToAddress",
            ],
        ),
        MethodSection::new(
            "accountsEdit",
            &[
                "parity_changePassword",
                "parity_hardwarePinMatrixAck",
                "parity_killAccount",
                "parity_removeAddress",
                "parity_setAccountMeta",
                "parity_setAccountName",
                "parity_testPassword",
            ],
        ),
        MethodSection::new(
            "upgrade",
            &[
                "parity_consensusCapability",
                "parity_executeUpgrade",
                "parity_upgradeReady",
                "parity_versionInfo",
            ],
        ),
        MethodSection::new(
            "vaults",
            &[
                "parity_changeVault",
                "parity_changeVaultPassword",
                "parity_closeVault",
                "parity_getVaultMeta",
                "parity_listOpenedVaults",
                "parity_listVaults",
                "parity_newVault",
                "parity_openVault",
                "parity_setVaultMeta",
            ],
        ),
        // shell_requestNewToken stays out: dapps need it to bootstrap.
        MethodSection::new(
            "shell",
            &[
                "shell_getApps",
                "shell_getFilteredMethods",
                "shell_getMethodPermissions",
                "shell_setAppVisibility",
                "shell_setMethodPermissions",
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::envelope::REQUEST_NEW_TOKEN;

    #[test]
    fn eth_accounts_is_in_accounts_section() {
        let classifier = MethodClassifier::new();
        let section = classifier.section_of("eth_accounts");
        assert_eq!(section.map(|s| s.name.as_str()), Some("accounts"));
        assert!(classifier.is_sensitive("eth_coinbase"));
    }

    #[test]
    fn plain_rpc_is_not_sensitive() {
        let classifier = MethodClassifier::new();
        assert!(classifier.section_of("eth_blockNumber").is_none());
        assert!(!classifier.is_sensitive("eth_call"));
    }

    #[test]
    fn token_bootstrap_is_never_sensitive() {
        assert!(!MethodClassifier::new().is_sensitive(REQUEST_NEW_TOKEN));
    }

    #[test]
    fn builtin_methods_are_unique_across_sections() {
        let classifier = MethodClassifier::new();
        let methods = classifier.sensitive_methods();
        let unique: HashSet<&str> = methods.iter().copied().collect();
        assert_eq!(unique.len(), methods.len());
    }

    #[test]
    fn custom_sections_replace_builtin() {
        let classifier = MethodClassifier::with_sections(vec![MethodSection::new(
            "accounts",
            &["eth_accounts", "eth_coinbase"],
        )]);
        assert_eq!(
            classifier.sensitive_methods(),
            vec!["eth_accounts", "eth_coinbase"]
        );
        assert!(!classifier.is_sensitive("parity_killAccount"));
    }
}
