//! Safe wrappers around FFmpeg FFI calls.
//!
//! Every function in this module is `pub` and **safe** to call. All `unsafe`
//! blocks are contained here with explicit safety arguments.

use ffmpeg_next as ffmpeg;
use ffmpeg_next::util::format::sample::{Sample, Type as SampleType};
use ffmpeg_next::util::frame::Audio as AudioFrame;

// ── Codec-parameter field accessors ─────────────────────────────────────────

/// Read `sample_rate` from an `AVCodecParameters` struct.
///
/// `ffmpeg-next` does not expose this field through a safe accessor.
pub fn codec_params_sample_rate(params: &ffmpeg::codec::parameters::Parameters) -> u32 {
    // SAFETY: `params.as_ptr()` returns a valid non-null pointer for the
    // lifetime of `params`. `sample_rate` is a plain i32 field.
    unsafe { (*params.as_ptr()).sample_rate.max(0) as u32 }
}

/// Read `ch_layout.nb_channels` from an `AVCodecParameters` struct.
pub fn codec_params_channels(params: &ffmpeg::codec::parameters::Parameters) -> u16 {
    // SAFETY: same as `codec_params_sample_rate`.
    unsafe { (*params.as_ptr()).ch_layout.nb_channels.max(0) as u16 }
}

/// Read the source bit depth from an `AVCodecParameters` struct.
///
/// Prefers `bits_per_raw_sample` (set by lossless decoders), then
/// `bits_per_coded_sample` (set for PCM). Returns 0 when neither is known.
pub fn codec_params_bits_per_sample(params: &ffmpeg::codec::parameters::Parameters) -> u32 {
    // SAFETY: same as `codec_params_sample_rate`.
    let (raw, coded) = unsafe {
        let p = params.as_ptr();
        ((*p).bits_per_raw_sample, (*p).bits_per_coded_sample)
    };
    if raw > 0 {
        raw as u32
    } else {
        coded.max(0) as u32
    }
}

/// Allocate a fresh `AVCodecParameters`, copy the encoder context into it,
/// and return it as a safe `ffmpeg::codec::Parameters`.
///
/// Used to describe the output stream to the muxer.
pub fn encoder_codec_parameters(
    encoder: &ffmpeg::codec::encoder::Audio,
) -> ffmpeg::codec::Parameters {
    use std::ops::Deref;
    use std::rc::Rc;
    let ctx: &ffmpeg::codec::Context = encoder.deref();
    // SAFETY: `avcodec_parameters_from_context` copies fields from a valid,
    // open encoder context into a freshly allocated parameters struct.
    unsafe {
        let params = ffmpeg::ffi::avcodec_parameters_alloc();
        ffmpeg::ffi::avcodec_parameters_from_context(params, ctx.as_ptr());
        ffmpeg::codec::Parameters::wrap(params, None::<Rc<dyn std::any::Any>>)
    }
}

/// Zero out `codec_tag` on an output stream so the muxer picks the tag for
/// the target container.
///
/// Must be called after `set_parameters(...)` and before `write_header`.
pub fn stream_reset_codec_tag(out_stream: &mut ffmpeg::format::stream::StreamMut) {
    // SAFETY: `codecpar` is set by `set_parameters` and is non-null; writing
    // 0 to the plain u32 `codec_tag` field is always valid.
    unsafe {
        (*(*out_stream.as_mut_ptr()).codecpar).codec_tag = 0;
    }
}

// ── Resampler ───────────────────────────────────────────────────────────────

/// Upper bound of output samples the resampler can produce for the next
/// `in_samples` input samples, including samples it already buffers.
///
/// With `in_samples == 0` this is what a flush can still emit.
pub fn resampler_out_samples(
    context: &mut ffmpeg::software::resampling::Context,
    in_samples: usize,
) -> usize {
    // SAFETY: the context pointer is valid and initialized for the lifetime of
    // `context`; `swr_get_out_samples` only reads its state.
    let n = unsafe { ffmpeg::ffi::swr_get_out_samples(context.as_mut_ptr(), in_samples as i32) };
    n.max(0) as usize
}

// ── Muxer lookup ────────────────────────────────────────────────────────────

/// Whether the muxer named `name` stores codec extradata out of band
/// (`AVFMT_GLOBALHEADER`). `None` if no such muxer is registered.
///
/// Looks the format up without creating an output file.
pub fn muxer_needs_global_header(name: &str) -> Option<bool> {
    let name = std::ffi::CString::new(name).ok()?;
    // SAFETY: `av_guess_format` only reads the registered muxer table and
    // returns a static descriptor or null.
    unsafe {
        let format = ffmpeg::ffi::av_guess_format(name.as_ptr(), std::ptr::null(), std::ptr::null());
        if format.is_null() {
            return None;
        }
        Some((*format).flags & ffmpeg::ffi::AVFMT_GLOBALHEADER as std::ffi::c_int != 0)
    }
}

// ── FLTP audio plane access ─────────────────────────────────────────────────

/// Samples of channel `ch` in a planar float frame.
///
/// `ffmpeg-next`'s `Audio::plane()` stops at planes whose `linesize` is 0, but
/// planar frames usually only fill `linesize[0]`, so the plane pointers are
/// read from `extended_data` instead. Returns `None` for any other sample
/// format or an out-of-range channel.
pub fn fltp_channel(frame: &AudioFrame, ch: usize) -> Option<&[f32]> {
    let (plane, samples) = fltp_plane(frame.as_ptr(), frame.format(), ch)?;
    // SAFETY: `fltp_plane` checked the pointer and alignment; a planar float
    // plane holds `nb_samples` f32 values and lives as long as `frame`.
    Some(unsafe { std::slice::from_raw_parts(plane as *const f32, samples) })
}

/// Mutable version of [`fltp_channel`].
pub fn fltp_channel_mut(frame: &mut AudioFrame, ch: usize) -> Option<&mut [f32]> {
    let format = frame.format();
    let (plane, samples) = fltp_plane(frame.as_mut_ptr(), format, ch)?;
    // SAFETY: see `fltp_channel`; the frame is borrowed mutably.
    Some(unsafe { std::slice::from_raw_parts_mut(plane as *mut f32, samples) })
}

fn fltp_plane(
    frame: *const ffmpeg::ffi::AVFrame,
    format: Sample,
    ch: usize,
) -> Option<(*mut u8, usize)> {
    if format != Sample::F32(SampleType::Planar) {
        return None;
    }
    // SAFETY: `frame` comes from a live `Audio` frame.
    unsafe {
        let channels = (*frame).ch_layout.nb_channels.max(0) as usize;
        let samples = (*frame).nb_samples.max(0) as usize;
        let planes = (*frame).extended_data;
        if ch >= channels || planes.is_null() {
            return None;
        }
        let plane = *planes.add(ch);
        if plane.is_null() || (plane as usize) % std::mem::align_of::<f32>() != 0 {
            return None;
        }
        Some((plane, samples))
    }
}
