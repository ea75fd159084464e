use anyhow::{Result, anyhow};

use crate::category::{PerCategory, RequestCategory};

/// Opaque access token for the upstream API.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Short form that is safe to log.
    pub fn redacted(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 4 {
            return "****".to_string();
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("****{tail}")
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Credential").field(&self.redacted()).finish()
    }
}

/// Credentials for one category, tried in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackChain(Vec<Credential>);

impl FallbackChain {
    pub fn new(credentials: Vec<Credential>) -> Result<Self> {
        if credentials.is_empty() {
            return Err(anyhow!("A fallback chain needs at least one credential"));
        }
        for (i, credential) in credentials.iter().enumerate() {
            if credentials[..i].contains(credential) {
                return Err(anyhow!(
                    "A fallback chain lists credential {} more than once",
                    credential.redacted()
                ));
            }
        }
        Ok(Self(credentials))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Credential for `attempt`, wrapping back to the primary past the end.
    pub fn get(&self, attempt: usize) -> &Credential {
        &self.0[attempt % self.0.len()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Credential> {
        self.0.iter()
    }
}

/// Fixed set of fallback chains, one per [`RequestCategory`].
#[derive(Debug, Clone)]
pub struct KeyRegistry {
    chains: PerCategory<FallbackChain>,
}

impl KeyRegistry {
    pub fn new(chains: PerCategory<FallbackChain>) -> Self {
        Self { chains }
    }

    /// Every category uses `keys`, rotated so each one starts from a
    /// different primary credential.
    pub fn rotated(keys: &[Credential]) -> Result<Self> {
        if keys.is_empty() {
            return Err(anyhow!("At least one API key is required"));
        }

        let registry = PerCategory::try_from_fn(|category| {
            let offset = category.index() % keys.len();
            FallbackChain::new(keys[offset..].iter().chain(&keys[..offset]).cloned().collect())
        })?;

        Ok(Self::new(registry))
    }

    /// Chains given as index orderings into `keys`.
    pub fn from_orders(keys: &[Credential], orders: &PerCategory<Vec<usize>>) -> Result<Self> {
        let chains = PerCategory::try_from_fn(|category| -> Result<FallbackChain> {
            let order = &orders[category];
            let mut credentials = Vec::with_capacity(order.len());
            for (position, &index) in order.iter().enumerate() {
                if order[..position].contains(&index) {
                    return Err(anyhow!("Fallback order for '{category}' repeats key #{index}"));
                }
                let key = keys.get(index).ok_or_else(|| {
                    anyhow!(
                        "Fallback order for '{category}' refers to key #{index}, but only {} key(s) are configured",
                        keys.len()
                    )
                })?;
                credentials.push(key.clone());
            }
            if credentials.is_empty() {
                return Err(anyhow!("Fallback order for '{category}' is empty"));
            }
            FallbackChain::new(credentials)
        })?;

        Ok(Self::new(chains))
    }

    pub fn chain(&self, category: RequestCategory) -> &FallbackChain {
        &self.chains[category]
    }
}
