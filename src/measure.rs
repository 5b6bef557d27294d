use serde::Serialize;

// ─── Measurement tree ────────────────────────────────────────────

/// A completed timed interval: either a leaf [`Sample`] or a named [`Span`]
/// enclosing an ordered list of child measurements. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub enum Measurement {
    Sample(Sample),
    Span(Span),
}

/// A leaf timed interval. Timestamps are ms since the process epoch.
#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    pub name: String,
    pub start_ms: u64,
    pub end_ms: u64,
}

/// A named interval whose start/end bound its children.
#[derive(Debug, Clone, Serialize)]
pub struct Span {
    pub name: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub children: Vec<Measurement>,
}

impl Sample {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

impl Measurement {
    pub fn name(&self) -> &str {
        match self {
            Measurement::Sample(s) => &s.name,
            Measurement::Span(s) => &s.name,
        }
    }

    pub fn start_ms(&self) -> u64 {
        match self {
            Measurement::Sample(s) => s.start_ms,
            Measurement::Span(s) => s.start_ms,
        }
    }

    pub fn end_ms(&self) -> u64 {
        match self {
            Measurement::Sample(s) => s.end_ms,
            Measurement::Span(s) => s.end_ms,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms().saturating_sub(self.start_ms())
    }

    /// Flatten to the leaf samples, depth-first and left-to-right, so nested
    /// timings still produce flat CSV rows. A childless span yields nothing.
    pub fn unroll(&self) -> Vec<&Sample> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a Sample>) {
        match self {
            Measurement::Sample(sample) => leaves.push(sample),
            Measurement::Span(span) => {
                for child in &span.children {
                    child.collect_leaves(leaves);
                }
            }
        }
    }

    /// Append one `timestamp,task,len` plotting row per leaf, all sharing
    /// the caller-supplied timestamp prefix.
    pub(crate) fn write_plotting_rows(&self, prefix_ts: u64, out: &mut String) {
        use std::fmt::Write;
        for leaf in self.unroll() {
            let _ = writeln!(out, "{},{},{}", prefix_ts, leaf.name, leaf.duration_ms());
        }
    }
}
