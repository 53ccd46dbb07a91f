//! Template-match confidence scoring between two static images.
//!
//! Independent of the streaming pipeline: every comparison is a synchronous,
//! stateless request. Three correlation passes are run and the best result
//! is taken deterministically; the raw score is then calibrated by the
//! dimension/size adjustments before being mapped to a quality label.
//!
//! Asymmetry is documented behavior: confidence(A, B) need not equal
//! confidence(B, A) when the images differ in size.

mod coeff;

use std::path::{Path, PathBuf};

use image::imageops::crop_imm;
use image::{GrayImage, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use imageproc::template_matching::{find_extremes, match_template, MatchTemplateMethod};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMethod {
    /// Pixel-exact equality of same-sized images; no correlation pass ran.
    Direct,
    SqdiffNormed,
    CcorrNormed,
    CcoeffNormed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchQuality {
    PerfectIdentical,
    Perfect,
    Excellent,
    Good,
    Moderate,
    Weak,
    NoSignificant,
}

impl MatchQuality {
    /// Deterministic label from the final confidence via fixed breakpoints.
    pub fn from_confidence(confidence: f32) -> MatchQuality {
        if confidence >= 0.99 {
            MatchQuality::Perfect
        } else if confidence >= 0.8 {
            MatchQuality::Excellent
        } else if confidence >= 0.6 {
            MatchQuality::Good
        } else if confidence >= 0.4 {
            MatchQuality::Moderate
        } else if confidence >= 0.2 {
            MatchQuality::Weak
        } else {
            MatchQuality::NoSignificant
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchQuality::PerfectIdentical => "Perfect Match (Identical Images)",
            MatchQuality::Perfect => "Perfect Match",
            MatchQuality::Excellent => "Excellent Match",
            MatchQuality::Good => "Good Match",
            MatchQuality::Moderate => "Moderate Match",
            MatchQuality::Weak => "Weak Match",
            MatchQuality::NoSignificant => "No Significant Match",
        }
    }
}

impl std::fmt::Display for MatchQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompareReport {
    /// Final calibrated confidence, always in [0,1].
    pub confidence: f32,
    pub quality: MatchQuality,
    pub template_size: (u32, u32),
    pub search_size: (u32, u32),
    /// Top-left corner of the best-matching region in the search image.
    /// When the template was larger than the search image the roles were
    /// swapped and this is the search image's position inside the template;
    /// with mixed dimensions it refers to the top-left common region of
    /// both images.
    pub match_location: (u32, u32),
    pub method: MatchMethod,
    /// template_area / search_area.
    pub size_ratio: f64,
}

/// Compare two image files. Decode failures surface as
/// [`CompareError::ImageRead`]; everything past decoding is infallible.
pub fn compare_files(template: &Path, search: &Path) -> Result<CompareReport, CompareError> {
    let template_img = image::open(template).map_err(|source| CompareError::ImageRead {
        path: template.to_path_buf(),
        source,
    })?;
    let search_img = image::open(search).map_err(|source| CompareError::ImageRead {
        path: search.to_path_buf(),
        source,
    })?;
    Ok(compare_images(&template_img.to_luma8(), &search_img.to_luma8()))
}

/// Compare a grayscale template against a grayscale search image.
pub fn compare_images(template: &GrayImage, search: &GrayImage) -> CompareReport {
    let (tw, th) = template.dimensions();
    let (sw, sh) = search.dimensions();
    let same_dims = (tw, th) == (sw, sh);

    // Fast path: byte-identical images need no correlation at all.
    if same_dims && template.as_raw() == search.as_raw() {
        return CompareReport {
            confidence: 1.0,
            quality: MatchQuality::PerfectIdentical,
            template_size: (tw, th),
            search_size: (sw, sh),
            match_location: (0, 0),
            method: MatchMethod::Direct,
            size_ratio: 1.0,
        };
    }

    // The correlation passes need the template to fit inside the image.
    // An oversized template runs with the roles swapped (and gets the
    // size-ratio penalty below); with mixed dimensions neither image
    // contains the other, so the passes run over the top-left common
    // region of both.
    let fits = tw <= sw && th <= sh;
    let contains = sw <= tw && sh <= th;
    let (raw, location, method) = if fits {
        best_of_three(search, template)
    } else if contains {
        best_of_three(template, search)
    } else {
        let cw = tw.min(sw);
        let ch = th.min(sh);
        let t = crop_imm(template, 0, 0, cw, ch).to_image();
        let s = crop_imm(search, 0, 0, cw, ch).to_image();
        best_of_three(&s, &t)
    };

    let size_ratio = (tw as f64 * th as f64) / (sw as f64 * sh as f64);
    let confidence = adjust_confidence(raw, same_dims, size_ratio);
    let quality = MatchQuality::from_confidence(confidence);

    info!(
        raw,
        confidence,
        ?method,
        size_ratio,
        "comparison scored"
    );

    CompareReport {
        confidence,
        quality,
        template_size: (tw, th),
        search_size: (sw, sh),
        match_location: location,
        method,
        size_ratio,
    }
}

/// Run the three matching passes and keep the strictly best confidence.
/// Ties keep the earlier method, so the choice is deterministic.
fn best_of_three(image: &GrayImage, template: &GrayImage) -> (f32, (u32, u32), MatchMethod) {
    let mut best = f32::MIN;
    let mut best_loc = (0u32, 0u32);
    let mut best_method = MatchMethod::SqdiffNormed;

    // Minimum-difference metric: low is good, so invert.
    let sqdiff = match_template(image, template, MatchTemplateMethod::SumOfSquaredErrorsNormalized);
    let ext = find_extremes(&sqdiff);
    let conf = 1.0 - ext.min_value;
    debug!(conf, "sqdiff-normed pass");
    if conf > best {
        best = conf;
        best_loc = ext.min_value_location;
        best_method = MatchMethod::SqdiffNormed;
    }

    let ccorr = match_template(image, template, MatchTemplateMethod::CrossCorrelationNormalized);
    let ext = find_extremes(&ccorr);
    debug!(conf = ext.max_value, "ccorr-normed pass");
    if ext.max_value > best {
        best = ext.max_value;
        best_loc = ext.max_value_location;
        best_method = MatchMethod::CcorrNormed;
    }

    let (conf, loc) = coeff::match_coeff_normed(image, template);
    debug!(conf, "ccoeff-normed pass");
    if conf > best {
        best = conf;
        best_loc = loc;
        best_method = MatchMethod::CcoeffNormed;
    }

    (best, best_loc, best_method)
}

/// Confidence adjustments, in priority order:
/// same dims and near-perfect raw score snap to 1.0; same dims with a high
/// score get a capped boost; otherwise the size ratio penalizes templates
/// that are larger than, or vanishingly small against, the search image.
fn adjust_confidence(raw: f32, same_dims: bool, size_ratio: f64) -> f32 {
    let adjusted = if same_dims && raw > 0.95 {
        1.0
    } else if same_dims && raw > 0.8 {
        (raw * 1.1).min(0.98)
    } else if size_ratio > 1.0 {
        raw * 0.5
    } else if size_ratio < 0.01 {
        raw * 0.8
    } else {
        raw
    };
    adjusted.clamp(0.0, 1.0)
}

/// Side artifact: the search image with the matched region outlined.
pub fn annotate_match(search: &RgbImage, report: &CompareReport) -> RgbImage {
    let mut out = search.clone();
    let (x, y) = report.match_location;
    let (tw, th) = report.template_size;
    let (sw, sh) = report.search_size;
    // Swapped-roles result: the location points inside the template, so
    // there is nothing meaningful to outline on the search image.
    if sw <= tw && sh <= th && (tw, th) != (sw, sh) {
        return out;
    }
    let w = tw.min(out.width().saturating_sub(x)).max(1);
    let h = th.min(out.height().saturating_sub(y)).max(1);
    draw_hollow_rect_mut(
        &mut out,
        Rect::at(x as i32, y as i32).of_size(w, h),
        image::Rgb([0, 255, 0]),
    );
    out
}
