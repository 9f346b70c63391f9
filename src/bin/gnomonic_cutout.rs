use std::io::{
    BufWriter
    , Write
};

use anyhow::{
    Context
    , Result
};

use clap::{
    Arg
    , Command
};

use healpix_eb::{
    io::healpix_fits::read_map
    , polarization::{
        magnetic_field_angle
        , polarization_angle
        , polarized_intensity
    }
    , projection::Gnomonic
    , Ordering
};

fn main()->Result<()>{
    env_logger::init();

    let matches=Command::new("gnomonic_cutout")
    .about("Print a gnomonic cutout of a HEALPix map as text")
    .arg(Arg::new("infile")
        .short('i')
        .long("input")
        .takes_value(true)
        .value_name("fits")
        .required(true)
        .help("input healpix file")
    )
    .arg(Arg::new("field")
        .short('f')
        .long("field")
        .takes_value(true)
        .value_name("index")
        .default_value("0")
        .help("0-based column to project")
    )
    .arg(Arg::new("quantity")
        .short('q')
        .long("quantity")
        .takes_value(true)
        .possible_values(["map", "p", "psi", "psi_b"])
        .default_value("map")
        .help("map: the field itself; p, psi, psi_b: from columns 1 and 2 as Q and U")
    )
    .arg(Arg::new("lon")
        .long("lon")
        .takes_value(true)
        .value_name("deg")
        .default_value("170.0")
        .allow_hyphen_values(true)
        .help("centre longitude")
    )
    .arg(Arg::new("lat")
        .long("lat")
        .takes_value(true)
        .value_name("deg")
        .default_value("-15.0")
        .allow_hyphen_values(true)
        .help("centre latitude")
    )
    .arg(Arg::new("xsize")
        .short('x')
        .long("xsize")
        .takes_value(true)
        .value_name("pixels")
        .default_value("400")
        .help("cutout width and height")
    )
    .arg(Arg::new("reso")
        .short('r')
        .long("reso")
        .takes_value(true)
        .value_name("arcmin")
        .default_value("5.0")
        .help("arcmin per cutout pixel")
    )
    .get_matches();

    let infile=matches.value_of("infile").context("missing --input")?;
    let arg=|name: &str, default: &'static str| matches.value_of(name).unwrap_or(default).to_string();
    let field=arg("field", "0").parse::<usize>().context("field")?;
    let lon=arg("lon", "170.0").parse::<f64>().context("lon")?;
    let lat=arg("lat", "-15.0").parse::<f64>().context("lat")?;
    let xsize=arg("xsize", "400").parse::<usize>().context("xsize")?;
    let reso=arg("reso", "5.0").parse::<f64>().context("reso")?;

    let map=match arg("quantity", "map").as_str(){
        "map"=>read_map(infile, &[field], Ordering::Ring)?.remove(0),
        quantity=>{
            let qu=read_map(infile, &[1, 2], Ordering::Ring)?;
            let (q, u)=(&qu[0], &qu[1]);
            match quantity{
                "p"=>polarized_intensity(q, u)?,
                "psi"=>polarization_angle(q, u)?,
                _=>magnetic_field_angle(q, u)?,
            }
        }
    };

    let cut=Gnomonic::square(lon, lat, xsize, reso).project(&map);
    let stdout=std::io::stdout();
    let mut out=BufWriter::new(stdout.lock());
    for row in cut.rows(){
        let line: Vec<String>=row.iter().map(|x| format!("{:e}", x)).collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    out.flush()?;
    Ok(())
}
