//! ffmpeg filter graphs for the three reframing styles.
//!
//! Every graph reads `[0:v]` and labels its result `[v]`.

use crate::models::RenderStyle;

/// Background blur strength for [`RenderStyle::Blur`].
pub const BLUR_SIGMA: u32 = 16;

/// Build the `-filter_complex` graph that reframes the input to `width`x`height`.
pub fn filter_graph(style: RenderStyle, width: u32, height: u32) -> String {
    match style {
        RenderStyle::Fill => format!(
            "[0:v]scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1[v]",
            w = width,
            h = height
        ),
        RenderStyle::Black => format!(
            "[0:v]scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:black,setsar=1[v]",
            w = width,
            h = height
        ),
        RenderStyle::Blur => format!(
            "[0:v]split=2[bg][fg];\
             [bg]scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},gblur=sigma={sigma}[bgb];\
             [fg]scale={w}:{h}:force_original_aspect_ratio=decrease[fgs];\
             [bgb][fgs]overlay=(W-w)/2:(H-h)/2,setsar=1[v]",
            w = width,
            h = height,
            sigma = BLUR_SIGMA
        ),
    }
}
