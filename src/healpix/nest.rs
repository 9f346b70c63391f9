use super::utils::{ncap, nside2npix};

const JRLL: [i64; 12] = [2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4];
const JPLL: [i64; 12] = [1, 3, 5, 7, 0, 2, 4, 6, 1, 3, 5, 7];

fn spread_bits(v: u64) -> u64 {
    (0..32).fold(0, |acc, i| acc | (((v >> i) & 1) << (2 * i)))
}

fn compress_bits(v: u64) -> u64 {
    (0..32).fold(0, |acc, i| acc | (((v >> (2 * i)) & 1) << i))
}

fn isqrt(v: i64) -> i64 {
    let mut r = (v as f64).sqrt() as i64;
    while r * r > v {
        r -= 1;
    }
    while (r + 1) * (r + 1) <= v {
        r += 1;
    }
    r
}

fn nest2xyf(nside: usize, pix: usize) -> (i64, i64, usize) {
    let npface = nside * nside;
    let face = pix / npface;
    let ipf = (pix % npface) as u64;
    (
        compress_bits(ipf) as i64,
        compress_bits(ipf >> 1) as i64,
        face,
    )
}

fn xyf2nest(nside: usize, ix: i64, iy: i64, face: usize) -> usize {
    face * nside * nside + (spread_bits(ix as u64) + (spread_bits(iy as u64) << 1)) as usize
}

fn xyf2ring(nside: usize, ix: i64, iy: i64, face: usize) -> usize {
    let n = nside as i64;
    let npix = nside2npix(nside) as i64;
    let jr = JRLL[face] * n - ix - iy - 1;

    let (nr, n_before, shifted) = if jr < n {
        (jr, 2 * jr * (jr - 1), true)
    } else if jr > 3 * n {
        let nr = 4 * n - jr;
        (nr, npix - 2 * nr * (nr + 1), true)
    } else {
        (n, ncap(nside) as i64 + (jr - n) * 4 * n, (jr - n) & 1 == 0)
    };
    let kshift = if shifted { 0 } else { 1 };

    let mut jp = (JPLL[face] * nr + ix - iy + 1 + kshift) / 2;
    if jp > 4 * nr {
        jp -= 4 * nr;
    } else if jp < 1 {
        jp += 4 * nr;
    }
    (n_before + jp - 1) as usize
}

fn ring2xyf(nside: usize, pix: usize) -> (i64, i64, usize) {
    let n = nside as i64;
    let npix = nside2npix(nside) as i64;
    let ncap = ncap(nside) as i64;
    let nl2 = 2 * n;
    let pix = pix as i64;

    let (iring, iphi, kshift, nr, face) = if pix < ncap {
        let iring = (1 + isqrt(1 + 2 * pix)) >> 1;
        let iphi = (pix + 1) - 2 * iring * (iring - 1);
        (iring, iphi, 0, iring, (iphi - 1) / iring)
    } else if pix < npix - ncap {
        let ip = pix - ncap;
        let tmp = ip / (4 * n);
        let iring = tmp + n;
        let iphi = ip - tmp * 4 * n + 1;
        let kshift = (iring + n) & 1;
        let ire = tmp + 1;
        let irm = nl2 + 1 - tmp;
        let ifm = (iphi - (ire >> 1) + n - 1) / n;
        let ifp = (iphi - (irm >> 1) + n - 1) / n;
        let face = if ifp == ifm {
            ifp | 4
        } else if ifp < ifm {
            ifp
        } else {
            ifm + 8
        };
        (iring, iphi, kshift, n, face)
    } else {
        let ip = npix - pix;
        let nr = (1 + isqrt(2 * ip - 1)) >> 1;
        let iphi = 4 * nr + 1 - (ip - 2 * nr * (nr - 1));
        (2 * nl2 - nr, iphi, 0, nr, (iphi - 1) / nr + 8)
    };

    let irt = iring - (2 + (face >> 2)) * n + 1;
    let mut ipt = 2 * iphi - JPLL[face as usize] * nr - kshift - 1;
    if ipt >= nl2 {
        ipt -= 8 * n;
    }
    ((ipt - irt) >> 1, (-ipt - irt) >> 1, face as usize)
}

pub fn nest2ring(nside: usize, ipnest: usize) -> usize {
    let (ix, iy, face) = nest2xyf(nside, ipnest);
    xyf2ring(nside, ix, iy, face)
}

pub fn ring2nest(nside: usize, ipring: usize) -> usize {
    let (ix, iy, face) = ring2xyf(nside, ipring);
    xyf2nest(nside, ix, iy, face)
}

/// NESTED samples to RING order.
pub fn reorder_n2r<T: Copy>(nside: usize, data: &[T]) -> Vec<T> {
    (0..data.len())
        .map(|ipring| data[ring2nest(nside, ipring)])
        .collect()
}

/// RING samples to NESTED order.
pub fn reorder_r2n<T: Copy>(nside: usize, data: &[T]) -> Vec<T> {
    (0..data.len())
        .map(|ipnest| data[nest2ring(nside, ipnest)])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_values() {
        for pix in 0..12 {
            assert_eq!(nest2ring(1, pix), pix);
            assert_eq!(ring2nest(1, pix), pix);
        }
        assert_eq!(nest2ring(2, 0), 13);
        assert_eq!(ring2nest(2, 0), 3);
        assert_eq!(ring2nest(2, 13), 0);
    }

    #[test]
    fn test_bijection() {
        for nside in [1, 2, 4, 8, 16] {
            let npix = nside2npix(nside);
            let mut seen = vec![false; npix];
            for ipnest in 0..npix {
                let ipring = nest2ring(nside, ipnest);
                assert!(!seen[ipring], "nside {nside}: ring pixel {ipring} hit twice");
                seen[ipring] = true;
                assert_eq!(ring2nest(nside, ipring), ipnest);
            }
        }
    }

    #[test]
    fn test_bits() {
        assert_eq!(spread_bits(0b111), 0b10101);
        assert_eq!(compress_bits(0b10101), 0b111);
        assert_eq!(compress_bits(0b01010), 0);
    }

    proptest! {
        #[test]
        fn reorder_round_trip(order in 0u32..5, seed in any::<u64>()) {
            let nside = 1usize << order;
            let npix = nside2npix(nside);
            let data: Vec<u64> = (0..npix as u64).map(|i| i.wrapping_mul(seed | 1)).collect();
            let back = reorder_n2r(nside, &reorder_r2n(nside, &data));
            prop_assert_eq!(back, data);
        }
    }
}
