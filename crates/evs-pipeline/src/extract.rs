//! Standard per-level observable extraction.
//!
//! Every value is fetched first; quantities and columns are written only
//! once all fetches of the level have succeeded.

use evs_core::errors::EvsError;
use evs_core::{FourVector, Level};
use tracing::warn;

use crate::record::{GenColumns, LevelQuantities, RecColumns};
use crate::service::{CalcService, Kinematics, Method, Scalar};

/// Stateless extractor shared by every analysis variant.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObservableExtractor;

struct Fetcher<'a> {
    service: &'a dyn CalcService,
    level: Level,
}

impl<'a> Fetcher<'a> {
    fn tag(&self, field: &str, err: EvsError) -> EvsError {
        let mut err = err
            .with_context("field", field)
            .with_context("level", self.level.as_str());
        if let Some(id) = self.service.event_id() {
            err = err
                .with_context("run", id.run.to_string())
                .with_context("event", id.event.to_string());
        }
        err
    }

    fn kinematics(&self, field: &str, method: Method) -> Result<Kinematics, EvsError> {
        self.service
            .kinematics(self.level, method)
            .map_err(|err| self.tag(field, err))
    }

    fn scalar(&self, field: &str, scalar: Scalar) -> Result<f64, EvsError> {
        self.service
            .scalar(scalar)
            .map_err(|err| self.tag(field, err))
    }

    fn weight(&self) -> Result<f64, EvsError> {
        self.service
            .weight(self.level)
            .map_err(|err| self.tag("weight", err))
    }

    fn lepton(&self) -> Result<FourVector, EvsError> {
        self.service
            .scattered_lepton(self.level)
            .map_err(|err| self.tag("lepton", err))
    }

    fn hfs(&self) -> Result<FourVector, EvsError> {
        self.service
            .hadronic_final_state(self.level)
            .map_err(|err| self.tag("hfs", err))
    }

    fn photon(&self, lepton: &FourVector) -> Result<FourVector, EvsError> {
        let beams = self
            .service
            .beam_vectors()
            .map_err(|err| self.tag("beams", err))?;
        Ok(beams.lepton - *lepton)
    }
}

impl ObservableExtractor {
    /// Fills generator-level quantities and columns.
    pub fn extract_gen(
        service: &dyn CalcService,
        quantities: &mut LevelQuantities,
        columns: &mut GenColumns,
    ) -> Result<(), EvsError> {
        let fetch = Fetcher {
            service,
            level: Level::Gen,
        };
        let weight = fetch.weight()?;
        let truth = fetch.kinematics("gen_event_Q2", Method::True)?;
        let electron = fetch.kinematics("gen_event_Q2_e", Method::Electron)?;
        let e_sigma = fetch.kinematics("gen_event_Q2_es", Method::ESigma)?;
        let sigma = fetch.kinematics("gen_event_Q2_s", Method::Sigma)?;
        let lepton = fetch.lepton()?;
        let hfs = fetch.hfs()?;
        let photon = fetch.photon(&lepton)?;

        quantities.weight = weight;
        quantities.q2 = truth.q2;
        quantities.photon = photon;

        columns.event_weight = weight;
        columns.gen_event_x = truth.x;
        columns.gen_event_y = truth.y;
        columns.gen_event_q2 = truth.q2;
        columns.gen_event_q2_e = electron.q2;
        columns.gen_event_y_e = electron.y;
        columns.gen_event_x_e = electron.x;
        columns.gen_event_q2_es = e_sigma.q2;
        columns.gen_event_y_es = e_sigma.y;
        columns.gen_event_x_es = e_sigma.x;
        columns.gen_event_q2_s = sigma.q2;
        columns.gen_event_y_s = sigma.y;
        columns.gen_event_x_s = sigma.x;
        columns.gen_hfs_e = hfs.e;
        columns.gen_hfs_px = hfs.px;
        columns.gen_hfs_py = hfs.py;
        columns.gen_hfs_pz = hfs.pz;
        columns.gen_hfs_eta = hfs.eta();
        columns.gene_px = lepton.px;
        columns.gene_py = lepton.py;
        columns.gene_pz = lepton.pz;
        columns.gene_eta = lepton.eta();
        Ok(())
    }

    /// Fills reconstructed-level quantities and columns.
    ///
    /// `rec_method` selects the kinematics stored as the level's Q².
    pub fn extract_rec(
        service: &dyn CalcService,
        rec_method: Method,
        quantities: &mut LevelQuantities,
        columns: &mut RecColumns,
    ) -> Result<(), EvsError> {
        let fetch = Fetcher {
            service,
            level: Level::Rec,
        };
        let weight = fetch.weight()?;
        let selected = fetch.kinematics("q2", rec_method)?;
        let electron = fetch.kinematics("event_Q2_e", Method::Electron)?;
        let sigma = fetch.kinematics("event_Q2_s", Method::Sigma)?;
        let double_angle = fetch.kinematics("event_Q2_da", Method::DoubleAngle)?;
        let e_sigma = fetch.kinematics("event_Q2_es", Method::ESigma)?;
        let hadronic = fetch.kinematics("event_Q2_h", Method::Hadronic)?;
        let vertex_z = fetch.scalar("vertex_z", Scalar::VertexZ)?;
        let ptmiss = fetch.scalar("ptmiss", Scalar::PtMiss)?;
        let pth = fetch.scalar("pth", Scalar::PtCalo)?;
        let pt_da = fetch.scalar("ptratio_da", Scalar::HadronicPtDa)?;
        let acoplanarity = fetch.scalar("acoplanarity", Scalar::Acoplanarity)?;
        let empz = fetch.scalar("Empz", Scalar::EMinusPz)?;
        let lepton = fetch.lepton()?;
        let hfs = fetch.hfs()?;
        let photon = fetch.photon(&lepton)?;

        quantities.weight = weight;
        quantities.q2 = selected.q2;
        quantities.photon = photon;

        columns.event_y_e = electron.y;
        columns.event_q2_e = electron.q2;
        columns.event_x_e = electron.x;
        columns.event_y_s = sigma.y;
        columns.event_q2_s = sigma.q2;
        columns.event_x_s = sigma.x;
        columns.event_y_da = double_angle.y;
        columns.event_q2_da = double_angle.q2;
        columns.event_y_es = e_sigma.y;
        columns.event_q2_es = e_sigma.q2;
        columns.event_x_es = e_sigma.x;
        columns.event_q2_h = hadronic.q2;
        columns.event_y_h = hadronic.y;
        columns.vertex_z = vertex_z;
        columns.ptmiss = ptmiss;
        columns.pth = pth;
        columns.ptratio_da = ratio("ptratio_da", hfs.pt(), pt_da);
        columns.ptratio_ele = ratio("ptratio_ele", hfs.pt(), lepton.pt());
        columns.acoplanarity = acoplanarity;
        columns.empz = empz;
        columns.e_px = lepton.px;
        columns.e_py = lepton.py;
        columns.e_pz = lepton.pz;
        columns.e_eta = lepton.eta();
        columns.hfs_e = hfs.e;
        columns.hfs_px = hfs.px;
        columns.hfs_py = hfs.py;
        columns.hfs_pz = hfs.pz;
        columns.hfs_eta = hfs.eta();
        Ok(())
    }
}

/// Zero denominators keep the column default.
fn ratio(field: &str, numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        warn!(field, numerator, "zero denominator, ratio left at 0");
        return 0.0;
    }
    numerator / denominator
}
