//! Chart data handed to an external renderer.
//!
//! Nothing here draws. A [`Figure`] is a list of rows (or a grid of cells)
//! of [`Series`]: line, bar or scatter data plus dashed reference lines.
//! With the `serde` feature a figure serialises to JSON for a front end.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Kind {
    Line,
    Bar,
    Scatter,
}

/// One plotted series.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Series {
    pub kind: Kind,
    pub label: String,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    /// Horizontal reference lines at these y values.
    pub hlines: Vec<f64>,
    /// Vertical reference lines at these x values.
    pub vlines: Vec<f64>,
    pub marker_size: Option<f64>,
}

impl Series {
    pub fn new(kind: Kind, label: impl Into<String>, xs: Vec<f64>, ys: Vec<f64>) -> Self {
        Self {
            kind,
            label: label.into(),
            xs,
            ys,
            hlines: Vec::new(),
            vlines: Vec::new(),
            marker_size: None,
        }
    }

    pub fn line(label: impl Into<String>, xs: Vec<f64>, ys: Vec<f64>) -> Self {
        Self::new(Kind::Line, label, xs, ys)
    }

    pub fn bar(label: impl Into<String>, xs: Vec<f64>, ys: Vec<f64>) -> Self {
        Self::new(Kind::Bar, label, xs, ys)
    }

    pub fn scatter(label: impl Into<String>, xs: Vec<f64>, ys: Vec<f64>) -> Self {
        Self::new(Kind::Scatter, label, xs, ys)
    }

    /// `ys` against their index.
    pub fn indexed(kind: Kind, label: impl Into<String>, ys: Vec<f64>) -> Self {
        let xs = (0..ys.len()).map(|i| i as f64).collect();
        Self::new(kind, label, xs, ys)
    }

    pub fn with_hlines(mut self, ys: impl IntoIterator<Item = f64>) -> Self {
        self.hlines.extend(ys);
        self
    }

    pub fn with_vlines(mut self, xs: impl IntoIterator<Item = f64>) -> Self {
        self.vlines.extend(xs);
        self
    }

    pub fn with_marker_size(mut self, s: f64) -> Self {
        self.marker_size = Some(s);
        self
    }

    /// x-span of the horizontal reference lines: always includes 0.
    pub fn hline_extent(&self) -> Option<(f64, f64)> {
        extent_with_origin(&self.xs)
    }

    /// y-span of the vertical reference lines: always includes 0.
    pub fn vline_extent(&self) -> Option<(f64, f64)> {
        extent_with_origin(&self.ys)
    }
}

/// `[min(min(v), 0), max(max(v), 0)]` over the finite values.
fn extent_with_origin(vs: &[f64]) -> Option<(f64, f64)> {
    let mut finite = vs.iter().copied().filter(|v| v.is_finite()).peekable();
    finite.peek()?;
    Some(finite.fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

/// A full figure.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Figure {
    /// One series per full-width row.
    Rows(Vec<Series>),
    /// Rows of cells; a row of `k` cells spans `ncols` columns.
    Grid(Vec<Vec<Series>>),
}

impl Figure {
    pub fn nrows(&self) -> usize {
        match self {
            Figure::Rows(rows) => rows.len(),
            Figure::Grid(rows) => rows.len(),
        }
    }

    pub fn ncols(&self) -> usize {
        match self {
            Figure::Rows(rows) => usize::from(!rows.is_empty()),
            Figure::Grid(rows) => rows.iter().map(Vec::len).max().unwrap_or(0),
        }
    }

    pub fn series(&self) -> Vec<&Series> {
        match self {
            Figure::Rows(rows) => rows.iter().collect(),
            Figure::Grid(rows) => rows.iter().flatten().collect(),
        }
    }

    /// Column span `[start, end)` of every cell. A single cell takes the
    /// whole row; cells that divide the width evenly share it; otherwise
    /// each cell takes one column from the left.
    pub fn spans(&self) -> Vec<Vec<(usize, usize)>> {
        let ncols = self.ncols();
        let row_spans = |k: usize| -> Vec<(usize, usize)> {
            if k == 1 {
                vec![(0, ncols)]
            } else if k > 0 && ncols % k == 0 {
                let w = ncols / k;
                (0..k).map(|g| (g * w, (g + 1) * w)).collect()
            } else {
                (0..k).map(|g| (g, g + 1)).collect()
            }
        };
        match self {
            Figure::Rows(rows) => rows.iter().map(|_| row_spans(1)).collect(),
            Figure::Grid(rows) => rows.iter().map(|r| row_spans(r.len())).collect(),
        }
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Lag-`i` dot products `Σ x[t] · x[t+i]` for `i` in `1..n` as a bar series.
pub fn auto_correlation(xs: &[f64], n: usize) -> Series {
    let (lags, corr): (Vec<f64>, Vec<f64>) = (1..n)
        .filter(|&i| i < xs.len())
        .map(|i| {
            let c = xs[..xs.len() - i]
                .iter()
                .zip(&xs[i..])
                .map(|(a, b)| a * b)
                .sum::<f64>();
            (i as f64, c)
        })
        .unzip();
    Series::bar("auto correlation", lags, corr)
}

/// How to label each curve of a [`transform_gallery`].
#[derive(Clone, Debug)]
pub enum Labels {
    /// `"{prefix}-{params:?}"` per parameter set.
    Prefix(String),
    Explicit(Vec<String>),
}

/// One line per parameter set: `f(x, params)` over `xs`.
pub fn transform_gallery<F>(f: F, xs: &[f64], params: &[Vec<f64>], labels: Labels) -> Figure
where
    F: Fn(f64, &[f64]) -> f64,
{
    let names: Vec<String> = match labels {
        Labels::Prefix(p) => params.iter().map(|ps| format!("{p}-{ps:?}")).collect(),
        Labels::Explicit(ls) => ls,
    };
    Figure::Rows(
        params
            .iter()
            .zip(names)
            .map(|(ps, label)| {
                let ys = xs.iter().map(|&x| f(x, ps)).collect();
                Series::line(label, xs.to_vec(), ys)
            })
            .collect(),
    )
}
