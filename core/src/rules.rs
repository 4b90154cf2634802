use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainMatch {
    #[serde(default)]
    pub suffix: String,
    #[serde(default)]
    pub prefix: String,
}

impl DomainMatch {
    pub fn suffix(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            prefix: String::new(),
        }
    }

    pub fn prefix_suffix(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            prefix: prefix.into(),
        }
    }

    pub fn matches(&self, target: &str) -> bool {
        target.ends_with(&self.suffix) && target.starts_with(&self.prefix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRules {
    #[serde(default)]
    pub cdn: Vec<DomainMatch>,
    #[serde(default)]
    pub benign: Vec<DomainMatch>,
}

impl ClassificationRules {
    pub fn empty() -> Self {
        Self {
            cdn: Vec::new(),
            benign: Vec::new(),
        }
    }

    pub fn is_infrastructure_host(&self, name: &str) -> bool {
        self.cdn.iter().any(|matcher| matcher.matches(name))
    }

    pub fn merits_further_lookup(&self, name: &str) -> bool {
        if self.is_infrastructure_host(name) {
            return false;
        }
        !self.benign.iter().any(|matcher| matcher.matches(name))
    }
}

impl Default for ClassificationRules {
    fn default() -> Self {
        let benign = [
            ".awsglobalaccelerator.com",
            ".bc.googleusercontent.com",
            ".1e100.net",
            ".haip.transip.net",
            ".windows.net",
            ".cloudfront.net",
            ".one.com",
            ".mktossl.com",
            ".zendesk.com",
            ".cloudflare.com",
            ".document360.io",
            ".salesforce.com",
            ".hubapi.com",
            ".microsoft.com",
        ];

        let mut rules = Self::empty();
        rules
            .benign
            .push(DomainMatch::prefix_suffix("ec2-", ".amazonaws.com"));
        rules
            .benign
            .extend(benign.iter().map(|suffix| DomainMatch::suffix(*suffix)));
        rules.cdn.push(DomainMatch::suffix(".r.cloudfront.net"));
        rules
    }
}
