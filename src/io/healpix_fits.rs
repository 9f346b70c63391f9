//! HEALPix maps and coefficient sets as FITS binary tables.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use fitsio::{
    hdu::{FitsHdu, HduInfo},
    tables::{ColumnDataType, ColumnDescription},
    FitsFile,
};
use num::complex::Complex;

use crate::{
    alm::Alm,
    error::{ReadError, WriteError},
    map::{Ordering, SphereMap, StokesTriple},
};

/// First binary table of an open file.
struct Table {
    path: PathBuf,
    fptr: FitsFile,
    hdu: FitsHdu,
    /// Name and repeat count per column.
    columns: Vec<(String, usize)>,
    num_rows: usize,
    file_len: u64,
}

impl Table {
    fn open(path: &Path) -> Result<Self, ReadError> {
        let file_len = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ReadError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(source) => {
                return Err(ReadError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let mut fptr =
            FitsFile::open(path).map_err(|e| ReadError::malformed(path, e.to_string()))?;

        let mut hdu_idx = 0;
        while let Ok(hdu) = fptr.hdu(hdu_idx) {
            if let HduInfo::TableInfo {
                column_descriptions,
                num_rows,
                ..
            } = &hdu.info
            {
                let columns = column_descriptions
                    .iter()
                    .map(|c| (c.name.clone(), c.data_type.repeat))
                    .collect();
                let num_rows = *num_rows;
                return Ok(Self {
                    path: path.to_path_buf(),
                    fptr,
                    hdu,
                    columns,
                    num_rows,
                    file_len,
                });
            }
            hdu_idx += 1;
        }
        Err(ReadError::malformed(path, "no binary table extension"))
    }

    fn tfields(&self) -> usize {
        self.columns.len()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|(n, _)| n.trim().eq_ignore_ascii_case(name))
    }

    fn key_int(&mut self, name: &str) -> Option<i64> {
        self.hdu.read_key::<i64>(&mut self.fptr, name).ok()
    }

    fn key_str(&mut self, name: &str) -> Option<String> {
        self.hdu.read_key::<String>(&mut self.fptr, name).ok()
    }

    /// Every sample of column `field`, row by row.
    fn column_f64(&mut self, field: usize) -> Result<Vec<f64>, ReadError> {
        let (name, repeat) = match self.columns.get(field) {
            Some(column) => column.clone(),
            None => {
                return Err(ReadError::MissingField {
                    path: self.path.clone(),
                    field,
                    available: self.tfields(),
                })
            }
        };
        // no sample is smaller than a byte
        let total = self
            .num_rows
            .checked_mul(repeat)
            .filter(|&n| n as u64 <= self.file_len)
            .ok_or_else(|| {
                ReadError::malformed(
                    &self.path,
                    format!(
                        "column '{}' claims {} rows of {} samples, more than the file holds",
                        name, self.num_rows, repeat
                    ),
                )
            })?;
        self.hdu
            .read_col_range::<f64>(&mut self.fptr, &name, &(0..total))
            .map_err(|e| ReadError::malformed(&self.path, e.to_string()))
    }
}

/// Reads the HEALPix columns `fields` (0-based) of the first binary table
/// in `path` and returns them in `ordering`.
///
/// The file's `ORDERING` keyword is honoured, RING when absent. Columns
/// stored with a repeat count are flattened row by row.
pub fn read_map(
    path: impl AsRef<Path>,
    fields: &[usize],
    ordering: Ordering,
) -> Result<Vec<SphereMap>, ReadError> {
    let path = path.as_ref();
    log::info!("read {}", path.display());
    let mut table = Table::open(path)?;

    let file_ordering = match table.key_str("ORDERING") {
        Some(value) => Ordering::from_fits_keyword(&value).ok_or_else(|| {
            ReadError::malformed(path, format!("unknown ORDERING '{}'", value))
        })?,
        None => Ordering::Ring,
    };
    let nside = table.key_int("NSIDE");
    let invalid_map = |source| ReadError::InvalidMap {
        path: path.to_path_buf(),
        source,
    };

    fields
        .iter()
        .map(|&field| {
            let samples = table.column_f64(field)?;
            let map = SphereMap::new(samples, file_ordering).map_err(invalid_map)?;
            if let Some(n) = nside {
                if n != map.nside() as i64 {
                    return Err(ReadError::malformed(
                        path,
                        format!("NSIDE {} disagrees with {} samples", n, map.npix()),
                    ));
                }
            }
            log::debug!("field {}: {}", field, map.describe());
            map.to_ordering(ordering).map_err(invalid_map)
        })
        .collect()
}

/// Fields 0, 1 and 2 as I, Q and U.
pub fn read_stokes(path: impl AsRef<Path>, ordering: Ordering) -> Result<StokesTriple, ReadError> {
    let path = path.as_ref();
    let mut maps = read_map(path, &[0, 1, 2], ordering)?.into_iter();
    match (maps.next(), maps.next(), maps.next()) {
        (Some(i), Some(q), Some(u)) => {
            StokesTriple::new(i, q, u).map_err(|source| ReadError::InvalidMap {
                path: path.to_path_buf(),
                source,
            })
        }
        _ => Err(ReadError::malformed(path, "expected three Stokes fields")),
    }
}

fn invalid(path: &Path, message: impl Into<String>) -> WriteError {
    WriteError::InvalidData {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

/// Builds the file next to `path` and moves it into place once complete.
///
/// Without `overwrite` the final link fails if `path` appeared meanwhile, so
/// an existing file is never replaced.
fn write_staged(
    path: &Path,
    overwrite: bool,
    fill: impl FnOnce(&mut FitsFile) -> fitsio::errors::Result<()>,
) -> Result<(), WriteError> {
    let conflict = || WriteError::Conflict {
        path: path.to_path_buf(),
    };
    let io = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };
    if !overwrite && path.exists() {
        return Err(conflict());
    }

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let staging = tempfile::Builder::new()
        .prefix(".healpix_eb")
        .tempdir_in(parent)
        .map_err(io)?;
    let staged = staging.path().join("staged.fits");
    let fits = |source| WriteError::Fits {
        path: path.to_path_buf(),
        source,
    };
    let mut fptr = FitsFile::create(&staged).open().map_err(fits)?;
    fill(&mut fptr).map_err(fits)?;
    drop(fptr);

    let published = if overwrite {
        fs::rename(&staged, path)
    } else {
        fs::hard_link(&staged, path)
    };
    match published {
        Ok(()) => {
            log::info!("write {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(conflict()),
        Err(source) => Err(io(source)),
    }
}

/// Writes co-registered maps as one `D` column each, in their own ordering.
pub fn write_map(
    path: impl AsRef<Path>,
    maps: &[&SphereMap],
    column_names: &[&str],
    overwrite: bool,
) -> Result<(), WriteError> {
    let path = path.as_ref();
    let first = maps.first().ok_or_else(|| invalid(path, "no maps given"))?;
    if maps.iter().any(|m| !m.same_grid(first)) {
        return Err(invalid(path, "maps are not co-registered"));
    }
    if column_names.len() != maps.len() {
        return Err(invalid(
            path,
            format!("{} column names for {} maps", column_names.len(), maps.len()),
        ));
    }

    write_staged(path, overwrite, |fptr| {
        let descriptions = column_names
            .iter()
            .map(|name| {
                ColumnDescription::new(*name)
                    .with_type(ColumnDataType::Double)
                    .create()
            })
            .collect::<fitsio::errors::Result<Vec<_>>>()?;
        let hdu = fptr.create_table("HEALPIX".to_string(), &descriptions)?;
        for (name, map) in column_names.iter().zip(maps) {
            hdu.write_col(fptr, *name, map.as_slice())?;
        }
        hdu.write_key(fptr, "PIXTYPE", "HEALPIX".to_string())?;
        hdu.write_key(fptr, "ORDERING", first.ordering().fits_keyword().to_string())?;
        hdu.write_key(fptr, "NSIDE", first.nside() as i64)?;
        hdu.write_key(fptr, "FIRSTPIX", 0i64)?;
        hdu.write_key(fptr, "LASTPIX", first.npix() as i64 - 1)?;
        hdu.write_key(fptr, "INDXSCHM", "IMPLICIT".to_string())?;
        hdu.write_key(fptr, "OBJECT", "FULLSKY".to_string())?;
        Ok(())
    })
}

/// `l^2 + l + m + 1`, the conventional packed index of alm files.
pub fn alm_file_index(l: usize, m: usize) -> i64 {
    (l * l + l + m + 1) as i64
}

fn alm_from_file_index(index: i64) -> Option<(usize, usize)> {
    if index < 1 {
        return None;
    }
    let i = (index - 1) as usize;
    let mut l = (i as f64).sqrt() as usize;
    while l * l > i {
        l -= 1;
    }
    while (l + 1) * (l + 1) <= i {
        l += 1;
    }
    if i < l * l + l {
        return None;
    }
    Some((l, i - l * l - l))
}

/// Writes `alm` with `INDEX` (`J`), `REAL` and `IMAG` (`D`) columns.
pub fn write_alm(path: impl AsRef<Path>, alm: &Alm, overwrite: bool) -> Result<(), WriteError> {
    let path = path.as_ref();
    let index = alm
        .iter()
        .map(|(l, m, _)| i32::try_from(alm_file_index(l, m)))
        .collect::<Result<Vec<i32>, _>>()
        .map_err(|_| invalid(path, format!("lmax {} overflows the INDEX column", alm.lmax())))?;
    let real: Vec<f64> = alm.as_slice().iter().map(|a| a.re).collect();
    let imag: Vec<f64> = alm.as_slice().iter().map(|a| a.im).collect();

    write_staged(path, overwrite, |fptr| {
        let descriptions = [
            ColumnDescription::new("INDEX")
                .with_type(ColumnDataType::Int)
                .create()?,
            ColumnDescription::new("REAL")
                .with_type(ColumnDataType::Double)
                .create()?,
            ColumnDescription::new("IMAG")
                .with_type(ColumnDataType::Double)
                .create()?,
        ];
        let hdu = fptr.create_table("ALM".to_string(), &descriptions)?;
        hdu.write_col(fptr, "INDEX", &index)?;
        hdu.write_col(fptr, "REAL", &real)?;
        hdu.write_col(fptr, "IMAG", &imag)?;
        hdu.write_key(fptr, "MAX-LPOL", alm.lmax() as i64)?;
        hdu.write_key(fptr, "MAX-MPOL", alm.mmax() as i64)?;
        Ok(())
    })
}

/// Reads a coefficient set written by [`write_alm`] or by other HEALPix
/// tools using the same packed index. Missing coefficients are zero.
pub fn read_alm(path: impl AsRef<Path>) -> Result<Alm, ReadError> {
    let path = path.as_ref();
    log::info!("read {}", path.display());
    let mut table = Table::open(path)?;
    let mut column = |name: &str, fallback: usize| {
        let i = table.column_index(name).unwrap_or(fallback);
        table.column_f64(i)
    };
    let index = column("INDEX", 0)?;
    let real = column("REAL", 1)?;
    let imag = column("IMAG", 2)?;

    let lm: Vec<(usize, usize)> = index
        .iter()
        .map(|&i| {
            alm_from_file_index(i as i64)
                .ok_or_else(|| ReadError::malformed(path, format!("bad alm index {}", i)))
        })
        .collect::<Result<_, _>>()?;
    let lmax = match table.key_int("MAX-LPOL") {
        Some(l) if l >= 0 => l as usize,
        _ => lm.iter().map(|&(l, _)| l).max().unwrap_or(0),
    };
    let mmax = match table.key_int("MAX-MPOL") {
        Some(m) if m >= 0 => m as usize,
        _ => lm.iter().map(|&(_, m)| m).max().unwrap_or(0),
    };

    let mut alm = Alm::new(lmax, mmax);
    for ((l, m), (re, im)) in lm.into_iter().zip(real.into_iter().zip(imag)) {
        if l > alm.lmax() || m > alm.mmax() {
            return Err(ReadError::malformed(
                path,
                format!("coefficient ({}, {}) outside lmax {} mmax {}", l, m, lmax, mmax),
            ));
        }
        alm.set(l, m, Complex::new(re, im));
    }
    Ok(alm)
}
