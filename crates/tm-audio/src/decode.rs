use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tm_core::signal::Signal;

use crate::error::AudioError;

/// Decode an audio file into a mono [`Signal`].
///
/// Supports WAV, MP3, FLAC, OGG, AAC via symphonia. Channels are averaged;
/// rates above 24 kHz are decimated by two, which keeps every tempo of
/// interest while halving the STFT work.
///
/// # Errors
/// Returns an error if the file cannot be opened, holds no audio track, or
/// decodes to nothing.
///
/// # Example
/// ```no_run
/// use tm_audio::decode::decode_file;
/// let signal = decode_file("track.mp3").unwrap();
/// println!("{} s", signal.duration_secs());
/// ```
pub fn decode_file(path: impl AsRef<Path>) -> Result<Signal> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Cannot open audio file: {}", path.display()))?;
    let mss = MediaSourceStream::new(
        Box::new(file),
        symphonia::core::io::MediaSourceStreamOptions::default(),
    );

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .with_context(|| format!("Failed to probe audio format: {}", path.display()))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::NoAudioTrack(path.display().to_string()))?;

    let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
    let channels = track
        .codec_params
        .channels
        .map_or(1, symphonia::core::audio::Channels::count)
        .max(1);

    let downsample_factor = if sample_rate > 24000 { 2 } else { 1 };
    let final_sample_rate = sample_rate / downsample_factor;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create audio decoder")?;

    let track_id = track.id;
    let mut all_samples: Vec<f32> = Vec::new();
    let mut sample_idx = 0usize;
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut max_sample_frames: usize = 0;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                log::warn!("Audio decode packet error in {}: {e}", path.display());
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("Audio decode frame error in {}: {e}", path.display());
                continue;
            }
        };

        let spec = *decoded.spec();
        let num_frames = decoded.capacity();
        // Reuse SampleBuffer: only reallocate if this packet is bigger than current capacity
        if sample_buf.is_none() || num_frames > max_sample_frames {
            sample_buf = Some(SampleBuffer::<f32>::new(num_frames as u64, spec));
            max_sample_frames = num_frames;
        }
        let Some(buf) = sample_buf.as_mut() else {
            continue;
        };
        buf.copy_interleaved_ref(decoded);

        // Downmix to mono and decimate
        for chunk in buf.samples().chunks(channels) {
            if sample_idx % downsample_factor as usize == 0 {
                let mono: f32 = chunk.iter().sum::<f32>() / channels as f32;
                all_samples.push(mono);
            }
            sample_idx += 1;
        }
    }

    if all_samples.is_empty() {
        return Err(AudioError::EmptyStream(path.display().to_string()).into());
    }

    log::debug!(
        "Decoded {} samples @ {}Hz (original {}Hz) from {}",
        all_samples.len(),
        final_sample_rate,
        sample_rate,
        path.display()
    );

    Ok(Signal::new(all_samples, final_sample_rate)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Minimal 16-bit PCM WAV writer for fixtures.
    fn write_wav(path: &Path, sample_rate: u32, channels: u16, frames: &[i16]) {
        let data_len = (frames.len() * 2) as u32;
        let mut f = File::create(path).unwrap();
        f.write_all(b"RIFF").unwrap();
        f.write_all(&(36 + data_len).to_le_bytes()).unwrap();
        f.write_all(b"WAVEfmt ").unwrap();
        f.write_all(&16u32.to_le_bytes()).unwrap();
        f.write_all(&1u16.to_le_bytes()).unwrap();
        f.write_all(&channels.to_le_bytes()).unwrap();
        f.write_all(&sample_rate.to_le_bytes()).unwrap();
        f.write_all(&(sample_rate * u32::from(channels) * 2).to_le_bytes())
            .unwrap();
        f.write_all(&(channels * 2).to_le_bytes()).unwrap();
        f.write_all(&16u16.to_le_bytes()).unwrap();
        f.write_all(b"data").unwrap();
        f.write_all(&data_len.to_le_bytes()).unwrap();
        for s in frames {
            f.write_all(&s.to_le_bytes()).unwrap();
        }
    }

    #[test]
    fn decodes_mono_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        let frames: Vec<i16> = (0..22050).map(|i| ((i % 100) * 100) as i16).collect();
        write_wav(&path, 22050, 1, &frames);

        let signal = decode_file(&path).unwrap();
        assert_eq!(signal.sample_rate(), 22050);
        assert_eq!(signal.samples().len(), 22050);
    }

    #[test]
    fn stereo_48k_is_downmixed_and_decimated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        // Left = +8192, right = -8192: the mono downmix cancels out.
        let frames: Vec<i16> = (0..48000).flat_map(|_| [8192i16, -8192]).collect();
        write_wav(&path, 48000, 2, &frames);

        let signal = decode_file(&path).unwrap();
        assert_eq!(signal.sample_rate(), 24000);
        assert_eq!(signal.samples().len(), 24000);
        assert!(signal.samples().iter().all(|s| s.abs() < 1e-6));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = decode_file("/definitely/not/here.wav").unwrap_err();
        assert!(err.to_string().contains("Cannot open audio file"));
    }
}
