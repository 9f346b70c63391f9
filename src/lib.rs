pub mod alm;
pub mod cfg;
pub mod constants;
pub mod eb;
pub mod error;
pub mod fft;
pub mod healpix;
pub mod io;
pub mod map;
pub mod pipeline;
pub mod polarization;
pub mod projection;
pub mod sanitize;
pub mod sht;
pub mod synth;

pub use crate::{
    alm::Alm
    , cfg::{
        OutputNames
        , PipelineCfg
    }
    , constants::UNSEEN
    , eb::{
        default_lmax
        , eb_to_qu
        , max_lmax
        , qu_to_eb
        , EbPair
        , TransformParams
    }
    , error::{
        ConfigError
        , Error
        , MapError
        , ReadError
        , Result
        , TransformError
        , WriteError
    }
    , map::{
        Ordering
        , SphereMap
        , StokesTriple
    }
    , pipeline::Pipeline
    , sanitize::sanitize
};
