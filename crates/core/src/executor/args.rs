//! FFmpeg argument construction.

use super::config::ExecutorConfig;
use crate::job::{ConversionJob, JobMode};
use crate::settings::EncodeSettings;

/// Builds the full ffmpeg argument vector for a job.
///
/// Deterministic: the same job and config always give the same vector.
pub fn build_args(job: &ConversionJob, config: &ExecutorConfig) -> Vec<String> {
    let mut args = vec![
        "-hide_banner".to_string(),
        "-nostdin".to_string(),
        "-loglevel".to_string(),
        config.ffmpeg_log_level.clone(),
        // Only overwrite a path the builder picked itself
        if job.overwrite { "-y" } else { "-n" }.to_string(),
    ];

    // Input seeking
    if let Some(start) = job.trim_start {
        args.extend(["-ss".to_string(), format_secs(start)]);
    }

    args.extend([
        "-i".to_string(),
        job.input.path.to_string_lossy().to_string(),
    ]);

    match (job.trim_start, job.trim_end) {
        (Some(start), Some(end)) => {
            args.extend(["-t".to_string(), format_secs(end - start)]);
        }
        (None, Some(end)) => args.extend(["-to".to_string(), format_secs(end)]),
        _ => {}
    }

    match job.mode {
        JobMode::Remux => {
            args.extend([
                "-c:v".to_string(),
                "copy".to_string(),
                "-c:a".to_string(),
                "copy".to_string(),
            ]);
        }
        JobMode::ExtractAudio => {
            args.push("-vn".to_string());
            push_audio_args(&mut args, &job.settings);
        }
        JobMode::Transcode => {
            push_video_args(&mut args, &job.settings);
            push_audio_args(&mut args, &job.settings);
        }
    }

    // Machine-readable progress on stdout
    args.extend([
        "-progress".to_string(),
        "pipe:1".to_string(),
        "-nostats".to_string(),
    ]);

    // Extra args
    args.extend(config.extra_ffmpeg_args.iter().cloned());

    // Output
    args.push(job.output_path.to_string_lossy().to_string());

    args
}

fn push_video_args(args: &mut Vec<String>, settings: &EncodeSettings) {
    let Some(codec) = settings.video_codec else {
        args.push("-vn".to_string());
        return;
    };

    args.extend(["-c:v".to_string(), codec.ffmpeg_encoder().to_string()]);

    if codec.takes_crf() {
        if let Some(quality) = settings.video_quality {
            args.extend(["-crf".to_string(), quality.crf().to_string()]);
        }
    }

    if codec.takes_preset() {
        if let Some(preset) = settings.preset {
            args.extend(["-preset".to_string(), preset.as_str().to_string()]);
        }
    }
}

fn push_audio_args(args: &mut Vec<String>, settings: &EncodeSettings) {
    let Some(codec) = settings.audio_codec else {
        return;
    };

    args.extend(["-c:a".to_string(), codec.ffmpeg_encoder().to_string()]);

    // Bitrate (for lossy formats)
    if !codec.is_lossless() {
        if let Some(quality) = settings.audio_quality {
            args.extend(["-b:a".to_string(), quality.ffmpeg_bitrate()]);
        }
    }
}

fn format_secs(secs: f64) -> String {
    let rounded = (secs * 1000.0).round() / 1000.0;
    format!("{}", rounded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{AudioCodec, AudioQuality, Preset, VideoCodec, VideoQuality};
    use crate::testing::fixtures;

    fn args_for(mode: JobMode, settings: EncodeSettings) -> Vec<String> {
        let mut job = fixtures::pending_job("/in/clip.mp4", "/out/clip.mkv");
        job.mode = mode;
        job.settings = settings;
        build_args(&job, &ExecutorConfig::default())
    }

    fn position(args: &[String], flag: &str) -> usize {
        args.iter().position(|a| a == flag).unwrap()
    }

    #[test]
    fn test_transcode_args() {
        let args = args_for(
            JobMode::Transcode,
            EncodeSettings {
                video_codec: Some(VideoCodec::H264),
                audio_codec: Some(AudioCodec::Aac),
                video_quality: Some(VideoQuality::Good),
                audio_quality: Some(AudioQuality::High),
                preset: Some(Preset::Medium),
            },
        );

        assert_eq!(
            args,
            [
                "-hide_banner", "-nostdin", "-loglevel", "warning", "-n", "-i", "/in/clip.mp4",
                "-c:v", "libx264", "-crf", "23", "-preset", "medium", "-c:a", "aac", "-b:a",
                "192k", "-progress", "pipe:1", "-nostats", "/out/clip.mkv",
            ]
        );
    }

    #[test]
    fn test_remux_copies_streams() {
        let args = args_for(
            JobMode::Remux,
            EncodeSettings {
                video_codec: Some(VideoCodec::H264),
                audio_codec: Some(AudioCodec::Aac),
                ..Default::default()
            },
        );
        assert_eq!(args[position(&args, "-c:v") + 1], "copy");
        assert_eq!(args[position(&args, "-c:a") + 1], "copy");
        assert!(!args.contains(&"-crf".to_string()));
        assert!(!args.contains(&"libx264".to_string()));
    }

    #[test]
    fn test_extract_audio_lossless_has_no_bitrate() {
        let args = args_for(
            JobMode::ExtractAudio,
            EncodeSettings {
                audio_codec: Some(AudioCodec::Flac),
                audio_quality: Some(AudioQuality::Extreme),
                ..Default::default()
            },
        );
        assert!(args.contains(&"-vn".to_string()));
        assert_eq!(args[position(&args, "-c:a") + 1], "flac");
        assert!(!args.contains(&"-b:a".to_string()));
        assert!(!args.contains(&"-c:v".to_string()));
    }

    #[test]
    fn test_vp9_ignores_crf_and_preset() {
        let args = args_for(
            JobMode::Transcode,
            EncodeSettings {
                video_codec: Some(VideoCodec::Vp9),
                audio_codec: Some(AudioCodec::Opus),
                video_quality: Some(VideoQuality::Good),
                audio_quality: Some(AudioQuality::Standard),
                preset: Some(Preset::Slow),
            },
        );
        assert_eq!(args[position(&args, "-c:v") + 1], "libvpx-vp9");
        assert!(!args.contains(&"-crf".to_string()));
        assert!(!args.contains(&"-preset".to_string()));
        assert_eq!(args[position(&args, "-b:a") + 1], "128k");
    }

    #[test]
    fn test_trim_window() {
        let job = fixtures::pending_job("/in/clip.mp4", "/out/clip.mkv")
            .with_trim(Some(10.0), Some(50.0));
        let args = build_args(&job, &ExecutorConfig::default());

        let ss = position(&args, "-ss");
        let input = position(&args, "-i");
        assert!(ss < input);
        assert_eq!(args[ss + 1], "10");
        assert_eq!(args[position(&args, "-t") + 1], "40");
        assert!(!args.contains(&"-to".to_string()));

        let job =
            fixtures::pending_job("/in/clip.mp4", "/out/clip.mkv").with_trim(None, Some(12.5));
        let args = build_args(&job, &ExecutorConfig::default());
        assert_eq!(args[position(&args, "-to") + 1], "12.5");
        assert!(!args.contains(&"-ss".to_string()));
    }

    #[test]
    fn test_overwrite_and_extra_args() {
        let job = fixtures::pending_job("/in/clip.mp4", "/out/clip_20240101000000.mkv")
            .with_overwrite(true);
        let config = ExecutorConfig {
            extra_ffmpeg_args: vec!["-threads".to_string(), "2".to_string()],
            ..Default::default()
        };
        let args = build_args(&job, &config);

        assert!(args.contains(&"-y".to_string()));
        assert!(!args.contains(&"-n".to_string()));
        let threads = position(&args, "-threads");
        assert_eq!(threads, args.len() - 3);
        assert_eq!(args.last().unwrap(), "/out/clip_20240101000000.mkv");
    }
}
