//! Load, sanitize, decompose and write, with each stage computed once per
//! [`Pipeline`] value.

use std::{cell::OnceCell, path::PathBuf};

use crate::{
    cfg::PipelineCfg,
    eb::{qu_to_eb, EbPair},
    error::{ReadError, Result, WriteError},
    io::healpix_fits::{read_map, write_alm, write_map},
    map::SphereMap,
    sanitize::remove_monopole,
};

pub struct Pipeline {
    cfg: PipelineCfg,
    qu: OnceCell<(SphereMap, SphereMap)>,
    eb: OnceCell<EbPair>,
}

impl Pipeline {
    pub fn new(cfg: PipelineCfg) -> Self {
        Self {
            cfg,
            qu: OnceCell::new(),
            eb: OnceCell::new(),
        }
    }

    /// Pipeline whose Q/U handle is already filled; `cfg.input` is not read.
    pub fn from_maps(cfg: PipelineCfg, q: SphereMap, u: SphereMap) -> Self {
        Self {
            cfg,
            qu: OnceCell::from((q, u)),
            eb: OnceCell::new(),
        }
    }

    pub fn cfg(&self) -> &PipelineCfg {
        &self.cfg
    }

    /// Q and U, read from `cfg.input` on first use.
    pub fn stokes_qu(&self) -> std::result::Result<&(SphereMap, SphereMap), ReadError> {
        if let Some(qu) = self.qu.get() {
            return Ok(qu);
        }
        let path = &self.cfg.input;
        let mut maps = read_map(path, &[self.cfg.q_field, self.cfg.u_field], self.cfg.ordering())?
            .into_iter();
        let qu = match (maps.next(), maps.next()) {
            (Some(q), Some(u)) => (q, u),
            _ => return Err(ReadError::malformed(path, "expected Q and U fields")),
        };
        log::info!("done");
        Ok(self.qu.get_or_init(|| qu))
    }

    /// E/B decomposition of [`Self::stokes_qu`], computed on first use.
    pub fn decomposition(&self) -> Result<&EbPair> {
        if let Some(eb) = self.eb.get() {
            return Ok(eb);
        }
        let (q, u) = self.stokes_qu()?;
        let params = self.cfg.transform_params();
        let eb = if self.cfg.remove_monopole {
            log::info!("removing the observed-pixel mean of Q and U");
            qu_to_eb(&remove_monopole(q), &remove_monopole(u), &params)?
        } else {
            qu_to_eb(q, u, &params)?
        };
        Ok(self.eb.get_or_init(|| eb))
    }

    /// Writes the E/B maps and coefficient sets; returns the written paths.
    pub fn write_outputs(&self) -> Result<Vec<PathBuf>> {
        let eb = self.decomposition()?;
        let names = &self.cfg.outputs;
        let overwrite = self.cfg.overwrite;

        let e_path = self.cfg.output_path(&names.e_map);
        let b_path = self.cfg.output_path(&names.b_map);
        let alm_e_path = self.cfg.output_path(&names.alm_e);
        let alm_b_path = self.cfg.output_path(&names.alm_b);
        let written = vec![e_path, b_path, alm_e_path, alm_b_path];
        if !overwrite {
            // nothing is written unless every target is free
            if let Some(taken) = written.iter().find(|p| p.exists()) {
                return Err(WriteError::Conflict {
                    path: taken.clone(),
                }
                .into());
            }
        }

        write_map(&written[0], &[&eb.e_map], &["E_MODE"], overwrite)?;
        write_map(&written[1], &[&eb.b_map], &["B_MODE"], overwrite)?;
        write_alm(&written[2], &eb.alm_e, overwrite)?;
        write_alm(&written[3], &eb.alm_b, overwrite)?;
        log::info!(
            "Done: wrote {}",
            written
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(written)
    }

    pub fn run(&self) -> Result<&EbPair> {
        self.write_outputs()?;
        self.decomposition()
    }
}
