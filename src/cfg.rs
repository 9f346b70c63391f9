use std::{
    fs::File
    , path::{
        Path
        , PathBuf
    }
};

use serde::{
    Serialize
    , Deserialize
};

use crate::{
    constants::DEFAULT_ITER
    , eb::TransformParams
    , error::ConfigError
    , map::Ordering
};

/// Run description for the E/B pipeline, read from YAML.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineCfg{
    /// HEALPix FITS file holding the Stokes maps
    pub input: PathBuf
    , pub q_field: usize
    , pub u_field: usize
    , pub nest: bool // load the maps in NESTED ordering
    , pub remove_monopole: bool
    , pub lmax: Option<usize>
    , pub iter: usize
    , pub out_dir: PathBuf
    , pub overwrite: bool
    , pub outputs: OutputNames
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputNames{
    pub e_map: String
    , pub b_map: String
    , pub alm_e: String
    , pub alm_b: String
}

impl Default for OutputNames{
    fn default()->Self{
        Self{
            e_map: "E_map.fits".to_string()
            , b_map: "B_map.fits".to_string()
            , alm_e: "almE.fits".to_string()
            , alm_b: "almB.fits".to_string()
        }
    }
}

impl Default for PipelineCfg{
    fn default()->Self{
        Self{
            input: PathBuf::from("data/HFI_SkyMap_353_2048_R2.02_full.fits")
            , q_field: 1
            , u_field: 2
            , nest: false
            , remove_monopole: false
            , lmax: None
            , iter: DEFAULT_ITER
            , out_dir: PathBuf::from(".")
            , overwrite: true
            , outputs: OutputNames::default()
        }
    }
}

impl PipelineCfg{
    pub fn from_yaml_file(path: impl AsRef<Path>)->Result<Self, ConfigError>{
        let path=path.as_ref();
        let file=File::open(path).map_err(|source| ConfigError::Io{path: path.to_path_buf(), source})?;
        serde_yaml::from_reader(file).map_err(|source| ConfigError::Parse{path: path.to_path_buf(), source})
    }

    pub fn from_yaml_str(s: &str)->Result<Self, serde_yaml::Error>{
        serde_yaml::from_str(s)
    }

    pub fn to_yaml_string(&self)->Result<String, serde_yaml::Error>{
        serde_yaml::to_string(self)
    }

    pub fn ordering(&self)->Ordering{
        Ordering::from_nest(self.nest)
    }

    pub fn transform_params(&self)->TransformParams{
        TransformParams{lmax: self.lmax, iter: self.iter}
    }

    pub fn output_path(&self, name: &str)->PathBuf{
        self.out_dir.join(name)
    }
}
