use crate::domain::SkyPosition;
use crate::error::{Result, SweetCatError};

/// Closest target to a source position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest {
    pub index: usize,
    pub separation_arcsec: f64,
}

/// Find the nearest target by great-circle separation.
///
/// Targets without a usable position are skipped. Ties keep the earliest index.
/// Returns [`SweetCatError::NoCandidates`] when nothing can be compared.
pub fn nearest(source: &SkyPosition, targets: &[Option<SkyPosition>]) -> Result<Nearest> {
    let mut best: Option<Nearest> = None;

    for (index, target) in targets.iter().enumerate() {
        let Some(target) = target else { continue };
        let separation_arcsec = source.separation_arcsec(target);
        if separation_arcsec.is_nan() {
            continue;
        }
        match best {
            Some(b) if b.separation_arcsec <= separation_arcsec => {}
            _ => {
                best = Some(Nearest {
                    index,
                    separation_arcsec,
                })
            }
        }
    }

    best.ok_or(SweetCatError::NoCandidates)
}
