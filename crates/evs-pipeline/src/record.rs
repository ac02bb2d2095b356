use evs_core::{FourVector, Level};
use serde::{Deserialize, Serialize};

/// Per-level bookkeeping for one event.
///
/// The same shape serves the generator and the reconstructed level; the
/// controller owns one instance per level and never lets them alias.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelQuantities {
    /// Event weight for this level.
    pub weight: f64,
    /// Squared momentum transfer (true Q² at gen level, the configured
    /// reconstruction method at rec level).
    pub q2: f64,
    /// Virtual photon four-vector, beam lepton minus scattered lepton.
    pub photon: FourVector,
    /// Combined verdict of the basic and analysis-specific cuts.
    pub is_good: bool,
}

/// Generator-level quantities.
pub type GenLevelQuantities = LevelQuantities;
/// Reconstructed-level quantities.
pub type RecLevelQuantities = LevelQuantities;

impl Default for LevelQuantities {
    fn default() -> Self {
        Self {
            weight: 1.0,
            q2: 0.0,
            photon: FourVector::default(),
            is_good: false,
        }
    }
}

impl LevelQuantities {
    /// Restores every field to its declared default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Mini-tree columns written by the generator-level extraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenColumns {
    /// Event weight (taken from the generator weight; data keeps 1).
    pub event_weight: f64,
    /// True Bjorken x.
    pub gen_event_x: f64,
    /// True inelasticity y.
    pub gen_event_y: f64,
    /// True Q².
    #[serde(rename = "gen_event_Q2")]
    pub gen_event_q2: f64,
    /// Q², electron method.
    #[serde(rename = "gen_event_Q2_e")]
    pub gen_event_q2_e: f64,
    /// y, electron method.
    pub gen_event_y_e: f64,
    /// x, electron method.
    pub gen_event_x_e: f64,
    /// Q², e-sigma method.
    #[serde(rename = "gen_event_Q2_es")]
    pub gen_event_q2_es: f64,
    /// y, e-sigma method.
    pub gen_event_y_es: f64,
    /// x, e-sigma method.
    pub gen_event_x_es: f64,
    /// Q², sigma method.
    #[serde(rename = "gen_event_Q2_s")]
    pub gen_event_q2_s: f64,
    /// y, sigma method.
    pub gen_event_y_s: f64,
    /// x, sigma method.
    pub gen_event_x_s: f64,
    /// Hadronic final state energy.
    #[serde(rename = "genHFS_E")]
    pub gen_hfs_e: f64,
    /// Hadronic final state px.
    #[serde(rename = "genHFS_px")]
    pub gen_hfs_px: f64,
    /// Hadronic final state py.
    #[serde(rename = "genHFS_py")]
    pub gen_hfs_py: f64,
    /// Hadronic final state pz.
    #[serde(rename = "genHFS_pz")]
    pub gen_hfs_pz: f64,
    /// Hadronic final state pseudorapidity.
    #[serde(rename = "genHFS_eta")]
    pub gen_hfs_eta: f64,
    /// Scattered lepton px.
    pub gene_px: f64,
    /// Scattered lepton py.
    pub gene_py: f64,
    /// Scattered lepton pz.
    pub gene_pz: f64,
    /// Scattered lepton pseudorapidity.
    pub gene_eta: f64,
}

impl Default for GenColumns {
    fn default() -> Self {
        Self {
            event_weight: 1.0,
            gen_event_x: 0.0,
            gen_event_y: 0.0,
            gen_event_q2: 0.0,
            gen_event_q2_e: 0.0,
            gen_event_y_e: 0.0,
            gen_event_x_e: 0.0,
            gen_event_q2_es: 0.0,
            gen_event_y_es: 0.0,
            gen_event_x_es: 0.0,
            gen_event_q2_s: 0.0,
            gen_event_y_s: 0.0,
            gen_event_x_s: 0.0,
            gen_hfs_e: 0.0,
            gen_hfs_px: 0.0,
            gen_hfs_py: 0.0,
            gen_hfs_pz: 0.0,
            gen_hfs_eta: 0.0,
            gene_px: 0.0,
            gene_py: 0.0,
            gene_pz: 0.0,
            gene_eta: 0.0,
        }
    }
}

/// Mini-tree columns written by the reconstructed-level extraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct RecColumns {
    /// y, electron method.
    pub event_y_e: f64,
    /// Q², electron method.
    #[serde(rename = "event_Q2_e")]
    pub event_q2_e: f64,
    /// x, electron method.
    pub event_x_e: f64,
    /// y, sigma method.
    pub event_y_s: f64,
    /// Q², sigma method.
    #[serde(rename = "event_Q2_s")]
    pub event_q2_s: f64,
    /// x, sigma method.
    pub event_x_s: f64,
    /// y, double-angle method.
    pub event_y_da: f64,
    /// Q², double-angle method.
    #[serde(rename = "event_Q2_da")]
    pub event_q2_da: f64,
    /// y, e-sigma method.
    pub event_y_es: f64,
    /// Q², e-sigma method.
    #[serde(rename = "event_Q2_es")]
    pub event_q2_es: f64,
    /// x, e-sigma method.
    pub event_x_es: f64,
    /// Q², hadronic method.
    #[serde(rename = "event_Q2_h")]
    pub event_q2_h: f64,
    /// y, hadronic method.
    pub event_y_h: f64,
    /// Primary vertex z position.
    pub vertex_z: f64,
    /// Missing transverse momentum.
    pub ptmiss: f64,
    /// Calorimetric hadronic transverse momentum.
    pub pth: f64,
    /// HFS transverse momentum over the double-angle hadronic reference.
    pub ptratio_da: f64,
    /// HFS transverse momentum over the scattered lepton transverse momentum.
    pub ptratio_ele: f64,
    /// Lepton-hadron acoplanarity.
    pub acoplanarity: f64,
    /// Longitudinal energy balance E − pz.
    #[serde(rename = "Empz")]
    pub empz: f64,
    /// Scattered lepton px.
    pub e_px: f64,
    /// Scattered lepton py.
    pub e_py: f64,
    /// Scattered lepton pz.
    pub e_pz: f64,
    /// Scattered lepton pseudorapidity.
    pub e_eta: f64,
    /// Hadronic final state energy.
    #[serde(rename = "HFS_E")]
    pub hfs_e: f64,
    /// Hadronic final state px.
    #[serde(rename = "HFS_px")]
    pub hfs_px: f64,
    /// Hadronic final state py.
    #[serde(rename = "HFS_py")]
    pub hfs_py: f64,
    /// Hadronic final state pz.
    #[serde(rename = "HFS_pz")]
    pub hfs_pz: f64,
    /// Hadronic final state pseudorapidity.
    #[serde(rename = "HFS_eta")]
    pub hfs_eta: f64,
}

/// Persisted column descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Stable column name used by downstream consumers.
    pub name: &'static str,
    /// Level whose extraction writes the column.
    pub level: Level,
}

const fn gen(name: &'static str) -> Column {
    Column {
        name,
        level: Level::Gen,
    }
}

const fn rec(name: &'static str) -> Column {
    Column {
        name,
        level: Level::Rec,
    }
}

/// Number of persisted mini-tree columns.
pub const COLUMN_COUNT: usize = 51;

/// One mini-tree row.
///
/// Split by level so that each extractor can only reach its own columns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct OutputRecord {
    /// Columns owned by the generator level.
    #[serde(flatten)]
    pub gen: GenColumns,
    /// Columns owned by the reconstructed level.
    #[serde(flatten)]
    pub rec: RecColumns,
}

impl OutputRecord {
    /// Column schema in persisted order.
    pub const COLUMNS: [Column; COLUMN_COUNT] = [
        gen("event_weight"),
        rec("event_y_e"),
        rec("event_Q2_e"),
        rec("event_x_e"),
        rec("event_y_s"),
        rec("event_Q2_s"),
        rec("event_x_s"),
        rec("event_y_da"),
        rec("event_Q2_da"),
        rec("event_y_es"),
        rec("event_Q2_es"),
        rec("event_x_es"),
        rec("event_Q2_h"),
        rec("event_y_h"),
        gen("gen_event_x"),
        gen("gen_event_y"),
        gen("gen_event_Q2"),
        gen("gen_event_Q2_e"),
        gen("gen_event_y_e"),
        gen("gen_event_x_e"),
        gen("gen_event_Q2_es"),
        gen("gen_event_y_es"),
        gen("gen_event_x_es"),
        gen("gen_event_Q2_s"),
        gen("gen_event_y_s"),
        gen("gen_event_x_s"),
        rec("vertex_z"),
        rec("ptmiss"),
        rec("pth"),
        rec("ptratio_da"),
        rec("ptratio_ele"),
        rec("acoplanarity"),
        rec("Empz"),
        rec("e_px"),
        rec("e_py"),
        rec("e_pz"),
        rec("e_eta"),
        rec("HFS_E"),
        rec("HFS_px"),
        rec("HFS_py"),
        rec("HFS_pz"),
        rec("HFS_eta"),
        gen("genHFS_E"),
        gen("genHFS_px"),
        gen("genHFS_py"),
        gen("genHFS_pz"),
        gen("genHFS_eta"),
        gen("gene_px"),
        gen("gene_py"),
        gen("gene_pz"),
        gen("gene_eta"),
    ];

    /// Returns the column names in persisted order.
    pub fn column_names() -> Vec<&'static str> {
        Self::COLUMNS.iter().map(|column| column.name).collect()
    }

    /// Returns the values in the order of [`OutputRecord::COLUMNS`].
    pub fn values(&self) -> [f64; COLUMN_COUNT] {
        let g = &self.gen;
        let r = &self.rec;
        [
            g.event_weight,
            r.event_y_e,
            r.event_q2_e,
            r.event_x_e,
            r.event_y_s,
            r.event_q2_s,
            r.event_x_s,
            r.event_y_da,
            r.event_q2_da,
            r.event_y_es,
            r.event_q2_es,
            r.event_x_es,
            r.event_q2_h,
            r.event_y_h,
            g.gen_event_x,
            g.gen_event_y,
            g.gen_event_q2,
            g.gen_event_q2_e,
            g.gen_event_y_e,
            g.gen_event_x_e,
            g.gen_event_q2_es,
            g.gen_event_y_es,
            g.gen_event_x_es,
            g.gen_event_q2_s,
            g.gen_event_y_s,
            g.gen_event_x_s,
            r.vertex_z,
            r.ptmiss,
            r.pth,
            r.ptratio_da,
            r.ptratio_ele,
            r.acoplanarity,
            r.empz,
            r.e_px,
            r.e_py,
            r.e_pz,
            r.e_eta,
            r.hfs_e,
            r.hfs_px,
            r.hfs_py,
            r.hfs_pz,
            r.hfs_eta,
            g.gen_hfs_e,
            g.gen_hfs_px,
            g.gen_hfs_py,
            g.gen_hfs_pz,
            g.gen_hfs_eta,
            g.gene_px,
            g.gene_py,
            g.gene_pz,
            g.gene_eta,
        ]
    }

    /// Looks up a single column by its persisted name.
    pub fn value(&self, name: &str) -> Option<f64> {
        Self::COLUMNS
            .iter()
            .zip(self.values())
            .find(|(column, _)| column.name == name)
            .map(|(_, value)| value)
    }

    /// Restores every column to its declared default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Everything the controller tracks for the event being processed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EventRecord {
    /// Generator-level quantities.
    pub gen: GenLevelQuantities,
    /// Reconstructed-level quantities.
    pub rec: RecLevelQuantities,
    /// Mini-tree row under construction.
    pub output: OutputRecord,
}

impl EventRecord {
    /// Discards the previous event's state.
    pub fn reset(&mut self) {
        self.gen.reset();
        self.rec.reset();
        self.output.reset();
    }

    /// True when both levels passed their cuts.
    pub fn both_good(&self) -> bool {
        self.gen.is_good && self.rec.is_good
    }
}
