use std::{
    fs::File
    , io::Write
};

use anyhow::{
    Context
    , Result
};

use clap::{
    Arg
    , Command
};

use healpix_eb::PipelineCfg;

pub fn main()->Result<()>{
    env_logger::init();

    let matches=Command::new("write_cfg")
    .about("Write a default pipeline cfg")
    .arg(Arg::new("outfile")
        .short('o')
        .long("out")
        .takes_value(true)
        .value_name("yaml")
        .required(true)
        .help("out cfg file")
    )
    .arg(Arg::new("input")
        .short('i')
        .long("input")
        .takes_value(true)
        .value_name("fits")
        .help("input HEALPix FITS file to put in the cfg")
    )
    .get_matches();

    let mut cfg=PipelineCfg::default();
    if let Some(input)=matches.value_of("input"){
        cfg.input=input.into();
    }

    let out=matches.value_of("outfile").context("missing --out")?;
    let text=cfg.to_yaml_string()?;
    let mut outfile=File::create(out).with_context(|| format!("cannot create {}", out))?;
    outfile.write_all(text.as_bytes())?;
    log::info!("wrote {}", out);
    Ok(())
}
