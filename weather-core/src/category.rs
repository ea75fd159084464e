use serde::{Deserialize, Serialize};
use std::{
    convert::TryFrom,
    ops::{Index, IndexMut},
};

/// Independent lane for throttling, usage counting and key rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestCategory {
    Current,
    Forecast,
    Historical,
}

impl RequestCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestCategory::Current => "current",
            RequestCategory::Forecast => "forecast",
            RequestCategory::Historical => "historical",
        }
    }

    pub const fn all() -> &'static [RequestCategory] {
        &[RequestCategory::Current, RequestCategory::Forecast, RequestCategory::Historical]
    }

    /// Position of the category in [`RequestCategory::all`].
    pub const fn index(self) -> usize {
        match self {
            RequestCategory::Current => 0,
            RequestCategory::Forecast => 1,
            RequestCategory::Historical => 2,
        }
    }
}

impl std::fmt::Display for RequestCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for RequestCategory {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "current" => Ok(RequestCategory::Current),
            "forecast" => Ok(RequestCategory::Forecast),
            "historical" | "history" => Ok(RequestCategory::Historical),
            _ => Err(anyhow::anyhow!(
                "Unknown request category '{value}'. Supported categories: current, forecast, historical."
            )),
        }
    }
}

/// One slot of `T` per [`RequestCategory`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerCategory<T>([T; 3]);

impl<T> PerCategory<T> {
    pub fn from_fn(mut f: impl FnMut(RequestCategory) -> T) -> Self {
        Self([
            f(RequestCategory::Current),
            f(RequestCategory::Forecast),
            f(RequestCategory::Historical),
        ])
    }

    pub fn try_from_fn<E>(
        mut f: impl FnMut(RequestCategory) -> Result<T, E>,
    ) -> Result<Self, E> {
        Ok(Self([
            f(RequestCategory::Current)?,
            f(RequestCategory::Forecast)?,
            f(RequestCategory::Historical)?,
        ]))
    }

    pub fn iter(&self) -> impl Iterator<Item = (RequestCategory, &T)> {
        RequestCategory::all().iter().copied().zip(self.0.iter())
    }
}

impl<T> Index<RequestCategory> for PerCategory<T> {
    type Output = T;

    fn index(&self, category: RequestCategory) -> &T {
        &self.0[category.index()]
    }
}

impl<T> IndexMut<RequestCategory> for PerCategory<T> {
    fn index_mut(&mut self, category: RequestCategory) -> &mut T {
        &mut self.0[category.index()]
    }
}
