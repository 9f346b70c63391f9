use anyhow::{
    Context
    , Result
};

use clap::{
    Arg
    , Command
};

use healpix_eb::{
    Pipeline
    , PipelineCfg
};

fn parse_opt<T: std::str::FromStr>(matches: &clap::ArgMatches, name: &str)->Result<Option<T>>
where T::Err: std::error::Error + Send + Sync + 'static
{
    matches.value_of(name)
    .map(|v| v.parse::<T>().with_context(|| format!("invalid value '{}' for --{}", v, name)))
    .transpose()
}

fn main()->Result<()>{
    env_logger::init();

    let matches=Command::new("healpix_eb")
    .about("Decompose HEALPix Stokes Q/U maps into E and B modes")
    .arg(Arg::new("cfg")
        .short('c')
        .long("cfg")
        .takes_value(true)
        .value_name("yaml")
        .required(false)
        .help("pipeline cfg file, see write_cfg")
    )
    .arg(Arg::new("input")
        .short('i')
        .long("input")
        .takes_value(true)
        .value_name("fits")
        .required(false)
        .help("input HEALPix FITS file")
    )
    .arg(Arg::new("q_field")
        .long("q-field")
        .takes_value(true)
        .value_name("index")
        .help("0-based column of Q")
    )
    .arg(Arg::new("u_field")
        .long("u-field")
        .takes_value(true)
        .value_name("index")
        .help("0-based column of U")
    )
    .arg(Arg::new("nest")
        .long("nest")
        .help("load the maps in NESTED ordering")
    )
    .arg(Arg::new("remove_monopole")
        .long("remove-monopole")
        .help("subtract the mean of the observed pixels from Q and U first")
    )
    .arg(Arg::new("lmax")
        .short('l')
        .long("lmax")
        .takes_value(true)
        .value_name("lmax")
        .help("max multipole, 3*nside-1 if absent")
    )
    .arg(Arg::new("iter")
        .short('n')
        .long("iter")
        .takes_value(true)
        .value_name("iter")
        .help("number of refinement iterations")
    )
    .arg(Arg::new("out_dir")
        .short('o')
        .long("out")
        .takes_value(true)
        .value_name("dir")
        .help("output directory")
    )
    .arg(Arg::new("no_overwrite")
        .long("no-overwrite")
        .help("fail instead of replacing existing outputs")
    )
    .get_matches();

    let mut cfg=match matches.value_of("cfg"){
        Some(path)=>PipelineCfg::from_yaml_file(path)?,
        None=>PipelineCfg::default(),
    };
    if let Some(input)=matches.value_of("input"){
        cfg.input=input.into();
    }
    if let Some(q)=parse_opt(&matches, "q_field")?{
        cfg.q_field=q;
    }
    if let Some(u)=parse_opt(&matches, "u_field")?{
        cfg.u_field=u;
    }
    if matches.is_present("nest"){
        cfg.nest=true;
    }
    if matches.is_present("remove_monopole"){
        cfg.remove_monopole=true;
    }
    if let Some(lmax)=parse_opt(&matches, "lmax")?{
        cfg.lmax=Some(lmax);
    }
    if let Some(iter)=parse_opt(&matches, "iter")?{
        cfg.iter=iter;
    }
    if let Some(dir)=matches.value_of("out_dir"){
        cfg.out_dir=dir.into();
    }
    if matches.is_present("no_overwrite"){
        cfg.overwrite=false;
    }

    let input=cfg.input.display().to_string();
    let pipeline=Pipeline::new(cfg);
    let eb=pipeline.run().with_context(|| format!("E/B decomposition of {} failed", input))?;
    log::info!("nside {} lmax {}: E power {:.6e}, B power {:.6e}", eb.nside(), eb.lmax(), eb.alm_e.energy(), eb.alm_b.energy());
    Ok(())
}
