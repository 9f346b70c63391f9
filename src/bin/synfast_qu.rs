use anyhow::{
    Context
    , Result
};

use clap::{
    Arg
    , Command
};

use healpix_eb::{
    io::healpix_fits::{
        write_alm
        , write_map
    }
    , synth::{
        flat_spectrum
        , synfast_pol
    }
    , SphereMap
};

fn main()->Result<()>{
    env_logger::init();

    let matches=Command::new("synfast_qu")
    .about("Write a Gaussian Q/U sky with flat E and B spectra")
    .arg(Arg::new("nside")
        .short('s')
        .long("nside")
        .takes_value(true)
        .value_name("nside")
        .required(true)
        .help("nside")
    )
    .arg(Arg::new("lmax")
        .short('l')
        .long("lmax")
        .takes_value(true)
        .value_name("lmax")
        .help("max multipole, 2*nside if absent")
    )
    .arg(Arg::new("cl_ee")
        .long("ee")
        .takes_value(true)
        .value_name("C_l")
        .default_value("1.0")
        .help("flat EE power")
    )
    .arg(Arg::new("cl_bb")
        .long("bb")
        .takes_value(true)
        .value_name("C_l")
        .default_value("0.0")
        .help("flat BB power")
    )
    .arg(Arg::new("seed")
        .long("seed")
        .takes_value(true)
        .value_name("seed")
        .default_value("0")
        .help("rng seed")
    )
    .arg(Arg::new("outfile")
        .short('o')
        .long("out")
        .takes_value(true)
        .value_name("fits")
        .required(true)
        .help("out healpix file with I, Q, U columns")
    )
    .arg(Arg::new("alm_prefix")
        .long("alm")
        .takes_value(true)
        .value_name("prefix")
        .help("also write <prefix>E.fits and <prefix>B.fits")
    )
    .get_matches();

    let nside=matches.value_of("nside").context("missing --nside")?.parse::<usize>().context("nside")?;
    let lmax=match matches.value_of("lmax"){
        Some(l)=>l.parse::<usize>().context("lmax")?,
        None=>2*nside,
    };
    let cl_ee=matches.value_of("cl_ee").unwrap_or("1.0").parse::<f64>().context("ee")?;
    let cl_bb=matches.value_of("cl_bb").unwrap_or("0.0").parse::<f64>().context("bb")?;
    let seed=matches.value_of("seed").unwrap_or("0").parse::<u64>().context("seed")?;
    let out=matches.value_of("outfile").context("missing --out")?;

    let (q, u, alm_e, alm_b)=synfast_pol(&flat_spectrum(lmax, cl_ee), &flat_spectrum(lmax, cl_bb), nside, lmax, seed)?;
    let i=SphereMap::zeros(nside)?;
    write_map(out, &[&i, &q, &u], &["I_STOKES", "Q_STOKES", "U_STOKES"], true)?;

    if let Some(prefix)=matches.value_of("alm_prefix"){
        write_alm(format!("{}E.fits", prefix), &alm_e, true)?;
        write_alm(format!("{}B.fits", prefix), &alm_b, true)?;
    }
    Ok(())
}
