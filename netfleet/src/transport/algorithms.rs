//! Algorithm policy applied to every SSH negotiation in a run.
//!
//! A policy is built from three layers:
//!
//! 1. a baseline of broken algorithms that is always excluded,
//! 2. a preset (`modern` or `legacy`),
//! 3. operator supplied `disabled` entries.
//!
//! `modern` starts from the russh defaults. `legacy` is an allow-list of what
//! old Cisco IOS images negotiate: `diffie-hellman-group14-sha1` for key
//! exchange (russh does not offer it by default), `ssh-rsa` host keys, and
//! SHA-1 signatures for RSA user keys.

use std::borrow::Cow;

use russh::Preferred;
use russh::kex;
use russh::keys::{Algorithm, HashAlg};
use serde::Deserialize;

use crate::error::TransportError;

/// Broken key exchanges that are never offered.
const BASELINE_KEX: &[&str] = &["diffie-hellman-group1-sha1"];

/// Broken host key and signature types that are never offered.
const BASELINE_KEYS: &[&str] = &["ssh-dss"];

/// The only key exchange `legacy` offers.
const LEGACY_KEX: &[&str] = &["diffie-hellman-group14-sha1"];

/// The only host key type `legacy` accepts.
const LEGACY_HOST_KEYS: &[&str] = &["ssh-rsa"];

/// RSA user key signatures `legacy` never produces.
const LEGACY_PUBKEYS_DENIED: &[&str] = &["rsa-sha2-256", "rsa-sha2-512"];

/// Pseudo-algorithms russh advertises in the kex list for protocol extensions.
const KEX_EXTENSION_PREFIXES: &[&str] = &["ext-info-", "kex-strict-"];

/// Named starting point for an [`AlgorithmPolicy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmPreset {
    /// russh defaults minus the baseline deny-list.
    #[default]
    Modern,

    /// Only what legacy Cisco IOS images negotiate.
    Legacy,
}

impl AlgorithmPreset {
    fn kex_allow_list(self) -> Option<&'static [&'static str]> {
        match self {
            Self::Modern => None,
            Self::Legacy => Some(LEGACY_KEX),
        }
    }

    fn host_key_allow_list(self) -> Option<&'static [&'static str]> {
        match self {
            Self::Modern => None,
            Self::Legacy => Some(LEGACY_HOST_KEYS),
        }
    }

    fn denied_pubkeys(self) -> &'static [&'static str] {
        match self {
            Self::Modern => &[],
            Self::Legacy => LEGACY_PUBKEYS_DENIED,
        }
    }
}

/// Operator supplied algorithm identifiers to exclude, per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DisabledAlgorithms {
    pub kex: Vec<String>,
    pub host_keys: Vec<String>,
    pub pubkeys: Vec<String>,
}

/// Immutable set of negotiation constraints shared by every device in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmPolicy {
    preset: AlgorithmPreset,
    disabled: DisabledAlgorithms,
}

impl Default for AlgorithmPolicy {
    fn default() -> Self {
        Self::new(AlgorithmPreset::Modern, DisabledAlgorithms::default())
    }
}

impl AlgorithmPolicy {
    /// Build a policy from a preset plus extra exclusions.
    ///
    /// The baseline deny-list is always merged in.
    pub fn new(preset: AlgorithmPreset, extra: DisabledAlgorithms) -> Self {
        let disabled = DisabledAlgorithms {
            kex: merge(&[BASELINE_KEX], extra.kex),
            host_keys: merge(&[BASELINE_KEYS], extra.host_keys),
            pubkeys: merge(&[BASELINE_KEYS, preset.denied_pubkeys()], extra.pubkeys),
        };

        Self { preset, disabled }
    }

    /// Policy for current OpenSSH-compatible devices.
    pub fn modern() -> Self {
        Self::default()
    }

    /// Policy for legacy Cisco IOS devices.
    pub fn legacy() -> Self {
        Self::new(AlgorithmPreset::Legacy, DisabledAlgorithms::default())
    }

    pub fn preset(&self) -> AlgorithmPreset {
        self.preset
    }

    /// The effective exclusions, baseline included.
    pub fn disabled(&self) -> &DisabledAlgorithms {
        &self.disabled
    }

    pub fn is_kex_allowed(&self, name: &str) -> bool {
        allowed_by(self.preset.kex_allow_list(), name) && !contains(&self.disabled.kex, name)
    }

    pub fn is_host_key_allowed(&self, name: &str) -> bool {
        allowed_by(self.preset.host_key_allow_list(), name) && !contains(&self.disabled.host_keys, name)
    }

    pub fn is_pubkey_allowed(&self, name: &str) -> bool {
        !contains(&self.disabled.pubkeys, name)
    }

    /// Translate the policy into russh negotiation preferences.
    ///
    /// Fails before any packet is sent if a category ends up empty, since the
    /// server could never agree with us.
    pub fn preferred(&self) -> Result<Preferred, TransportError> {
        let defaults = Preferred::default();

        let kex_candidates: Vec<kex::Name> = match self.preset {
            AlgorithmPreset::Legacy => vec![kex::DH_G14_SHA1],
            AlgorithmPreset::Modern => defaults.kex.iter().copied().filter(|n| !is_kex_extension(n)).collect(),
        };
        let mut kex_names: Vec<kex::Name> = kex_candidates
            .into_iter()
            .filter(|name| self.is_kex_allowed(name.as_ref()))
            .collect();
        if kex_names.is_empty() {
            return Err(TransportError::NoAllowedAlgorithm {
                category: "key exchange",
            });
        }
        kex_names.extend(defaults.kex.iter().copied().filter(is_kex_extension));

        let host_key_candidates: Vec<Algorithm> = match self.preset {
            AlgorithmPreset::Legacy => vec![Algorithm::Rsa { hash: None }],
            AlgorithmPreset::Modern => defaults.key.to_vec(),
        };
        let host_keys: Vec<Algorithm> = host_key_candidates
            .into_iter()
            .filter(|alg| self.is_host_key_allowed(alg.as_str()))
            .collect();
        if host_keys.is_empty() {
            return Err(TransportError::NoAllowedAlgorithm {
                category: "host key",
            });
        }

        Ok(Preferred {
            kex: Cow::Owned(kex_names),
            key: Cow::Owned(host_keys),
            ..defaults
        })
    }

    /// Refuse a user key whose algorithm the policy excludes.
    ///
    /// RSA keys pass here; their signature hash is chosen by
    /// [`Self::rsa_signature_hash`] once the server's preferences are known.
    pub fn check_user_key(&self, algorithm: &Algorithm) -> Result<(), TransportError> {
        if matches!(algorithm, Algorithm::Rsa { .. }) || self.is_pubkey_allowed(algorithm.as_str()) {
            Ok(())
        } else {
            Err(TransportError::NoAllowedAlgorithm {
                category: "public key",
            })
        }
    }

    /// Pick the signature hash for RSA user keys.
    ///
    /// `server_best` is what the server advertised through `server-sig-algs`
    /// (`None` when it advertised nothing, which implies plain `ssh-rsa`).
    pub fn rsa_signature_hash(
        &self,
        server_best: Option<HashAlg>,
    ) -> Result<Option<HashAlg>, TransportError> {
        let candidates: &[Option<HashAlg>] = match server_best {
            Some(HashAlg::Sha512) => &[Some(HashAlg::Sha512), Some(HashAlg::Sha256), None],
            Some(HashAlg::Sha256) => &[Some(HashAlg::Sha256), None],
            _ => &[None],
        };

        candidates
            .iter()
            .copied()
            .find(|hash| self.is_pubkey_allowed(rsa_signature_name(*hash)))
            .ok_or(TransportError::NoAllowedAlgorithm {
                category: "public key signature",
            })
    }
}

fn rsa_signature_name(hash: Option<HashAlg>) -> &'static str {
    match hash {
        Some(HashAlg::Sha512) => "rsa-sha2-512",
        Some(HashAlg::Sha256) => "rsa-sha2-256",
        _ => "ssh-rsa",
    }
}

fn is_kex_extension(name: &kex::Name) -> bool {
    let name: &str = name.as_ref();
    KEX_EXTENSION_PREFIXES.iter().any(|p| name.starts_with(p))
}

fn allowed_by(allow_list: Option<&[&str]>, name: &str) -> bool {
    allow_list.is_none_or(|list| list.iter().any(|n| n.eq_ignore_ascii_case(name)))
}

fn contains(list: &[String], name: &str) -> bool {
    list.iter().any(|n| n.eq_ignore_ascii_case(name))
}

/// Concatenate lists, dropping duplicates while keeping first-seen order.
fn merge(fixed: &[&[&str]], extra: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let all = fixed
        .iter()
        .flat_map(|list| list.iter().map(|s| s.to_string()))
        .chain(extra);
    for name in all {
        if !contains(&out, &name) {
            out.push(name);
        }
    }
    out
}
