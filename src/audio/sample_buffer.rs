use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer as DecodeBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

use super::frame::StereoFrame;
use crate::error::{AmbienceError, Result};

#[derive(Clone, Debug, Default)]
pub struct SampleBuffer {
    pub data: Vec<StereoFrame>, // decoded, already at the output rate
}

impl SampleBuffer {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// WAV goes through hound, everything else (mp3, m4a) through symphonia.
    pub fn load(path: &Path, target_rate: u32) -> Result<Self> {
        let is_wav = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
        let (frames, file_rate) = if is_wav { read_wav(path)? } else { read_compressed(path)? };
        let frames = if file_rate != target_rate {
            resample_linear(&frames, file_rate, target_rate)
        } else {
            frames
        };
        Ok(Self { data: frames })
    }
}

fn decode_error(path: &Path, reason: impl ToString) -> AmbienceError {
    AmbienceError::Decode { path: path.to_path_buf(), reason: reason.to_string() }
}

fn read_wav(path: &Path) -> Result<(Vec<StereoFrame>, u32)> {
    let mut reader = hound::WavReader::open(path).map_err(|e| decode_error(path, e))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| decode_error(path, e))?,
        hound::SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|x| x as f32 / max))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| decode_error(path, e))?
        }
    };

    Ok((interleaved_to_frames(&samples, spec.channels as usize), spec.sample_rate))
}

fn read_compressed(path: &Path) -> Result<(Vec<StereoFrame>, u32)> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }
    let probed = get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| decode_error(path, e))?;
    let mut format = probed.format;
    let track = format.default_track().ok_or_else(|| decode_error(path, "no default track"))?;
    let track_id = track.id;
    let mut decoder = get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_error(path, e))?;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| decode_error(path, "unknown sample rate"))?;

    let mut sample_buf: Option<DecodeBuffer<f32>> = None;
    let mut frames = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(_)) => break, // end of stream
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(decode_error(path, e)),
        };
        if packet.track_id() != track_id {
            continue;
        }
        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(_)) => continue, // skip a corrupt packet
            Err(e) => return Err(decode_error(path, e)),
        };
        let channels = decoded.spec().channels.count();
        let buf = sample_buf
            .get_or_insert_with(|| {
                DecodeBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec())
            });
        buf.copy_interleaved_ref(decoded);
        frames.extend(interleaved_to_frames(buf.samples(), channels));
    }
    Ok((frames, sample_rate))
}

// mono is duplicated, anything past two channels is dropped
fn interleaved_to_frames(samples: &[f32], channels: usize) -> Vec<StereoFrame> {
    match channels {
        0 => Vec::new(),
        1 => samples.iter().map(|&x| StereoFrame::mono(x)).collect(),
        n => samples
            .chunks_exact(n)
            .map(|c| StereoFrame { left: c[0], right: c[1] })
            .collect(),
    }
}

fn resample_linear(frames: &[StereoFrame], source_rate: u32, target_rate: u32) -> Vec<StereoFrame> {
    if source_rate == target_rate || source_rate == 0 || frames.is_empty() {
        return frames.to_vec();
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let out_len = (frames.len() as f64 * ratio).ceil() as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let src_pos = i as f64 / ratio; // fractional position in the source
        let idx = src_pos.floor() as usize;
        let frac = (src_pos - idx as f64) as f32;
        if idx >= frames.len() - 1 {
            out.push(frames[frames.len() - 1]);
        } else {
            let a = frames[idx];
            let b = frames[idx + 1];
            out.push(StereoFrame {
                left: a.left * (1.0 - frac) + b.left * frac,
                right: a.right * (1.0 - frac) + b.right * frac,
            });
        }
    }
    out
}
