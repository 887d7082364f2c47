// ── Host version ──────────────────────────────────────────────────────────────
//
// `BKA_GetVersion` returns strings such as "2.00.06" or "2.75.03".  Some
// exports only exist from a given release on, so binding needs an ordering.

use std::cmp::Ordering;

/// Version string reported by the host, with its dotted numeric components.
///
/// `raw` is kept exactly as reported: the length rule in `at_least` counts
/// surrounding whitespace too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostVersion {
    raw: String,
    parts: Option<Vec<u32>>,
}

impl HostVersion {
    pub fn parse(raw: &str) -> Self {
        let parts = raw
            .trim()
            .split('.')
            .map(|p| p.parse::<u32>().ok())
            .collect::<Option<Vec<_>>>()
            .filter(|p| !p.is_empty());
        Self {
            raw: raw.to_owned(),
            parts,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// `true` when this host is `since` or newer.
    ///
    /// Compares numerically by component ("2.5" == "2.05"); when either side
    /// does not parse, falls back to comparing the raw strings byte-wise.
    /// Version strings longer than the SDK's "x.yy.zz" format are always
    /// considered newer.
    pub fn at_least(&self, since: &str) -> bool {
        if self.raw.len() > 7 {
            return true;
        }
        let since = HostVersion::parse(since);
        let ord = match (&self.parts, &since.parts) {
            (Some(a), Some(b)) => compare_parts(a, b),
            _ => self.raw.as_bytes().cmp(since.raw.as_bytes()),
        };
        ord != Ordering::Less
    }
}

/// Missing trailing components count as zero ("2.40" == "2.40.00").
fn compare_parts(a: &[u32], b: &[u32]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|o| *o != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

impl std::fmt::Display for HostVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
