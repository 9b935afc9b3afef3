//! ffmpeg invocation builder.
//!
//! Renders the single space-delimited argument string the subprocess
//! channel expects. The container-side flags are fixed: FLV output with
//! the sequence-end footer and metadata suppressed, and `dump_extra` to
//! repeat SPS/PPS on every keyframe, since a stream consumer cannot assume
//! it saw the stream from its true beginning.

/// Encoder settings for one session.
///
/// Defaults reproduce a low-latency libx264 configuration: lookahead and
/// B-frames disabled so the first payload appears after the first frame.
#[derive(Debug, Clone)]
pub struct EncoderCommand {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Input frame rate.
    pub fps: u32,
    /// Raw input pixel layout fed to stdin.
    pub input_pixel_format: String,
    /// Encoded output pixel format.
    pub output_pixel_format: String,
    /// GOP size (keyframe interval).
    pub gop: u32,
    /// Number of B-frames. Non-zero values buffer frames inside the
    /// encoder and require a matching `latency_offset`.
    pub bframes: u32,
    /// Constant rate factor.
    pub crf: u32,
    /// Extra `-x264-params` string, if any.
    pub x264_params: Option<String>,
}

/// Zero-lookahead parameter set matching the default latency of 0.
pub const ZERO_LATENCY_X264_PARAMS: &str =
    "bframes=0:force-cfr=1:no-mbtree=1:sync-lookahead=0:sliced-threads=1:rc-lookahead=0";

impl EncoderCommand {
    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        Self {
            width,
            height,
            fps,
            input_pixel_format: "bgr24".to_string(),
            output_pixel_format: "yuv444p".to_string(),
            gop: 10,
            bframes: 0,
            crf: 10,
            x264_params: Some(ZERO_LATENCY_X264_PARAMS.to_string()),
        }
    }

    /// Size in bytes of one raw input frame.
    pub fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * self.bytes_per_pixel()
    }

    fn bytes_per_pixel(&self) -> usize {
        match self.input_pixel_format.as_str() {
            "gray" => 1,
            "bgra" | "rgba" => 4,
            // bgr24, rgb24 and anything else treated as packed 3-byte.
            _ => 3,
        }
    }

    /// Render the full ffmpeg argument string.
    ///
    /// Arguments must not contain embedded spaces; the channel splits the
    /// string on whitespace before spawn.
    pub fn args(&self) -> String {
        let mut args = format!(
            "-hide_banner -threads 1 -framerate {fps} -video_size {w}x{h} \
             -pixel_format {ipf} -f rawvideo -an -sn -dn -i pipe: \
             -threads 1 -vcodec libx264",
            fps = self.fps,
            w = self.width,
            h = self.height,
            ipf = self.input_pixel_format,
        );
        if let Some(params) = &self.x264_params {
            args.push_str(" -x264-params ");
            args.push_str(params);
        }
        args.push_str(&format!(
            " -g {gop} -bf {bf} -pix_fmt {opf} -crf {crf} \
             -f flv -flvflags no_sequence_end+no_metadata+no_duration_filesize \
             -bsf:v dump_extra -an -sn -dn pipe:",
            gop = self.gop,
            bf = self.bframes,
            opf = self.output_pixel_format,
            crf = self.crf,
        ));
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_command_is_zero_latency() {
        let cmd = EncoderCommand::new(1280, 720, 25);
        assert_eq!(cmd.bframes, 0);
        assert!(cmd
            .x264_params
            .as_deref()
            .unwrap()
            .contains("rc-lookahead=0"));
    }

    #[test]
    fn frame_size_follows_pixel_format() {
        let mut cmd = EncoderCommand::new(1280, 720, 25);
        assert_eq!(cmd.frame_size(), 1280 * 720 * 3);

        cmd.input_pixel_format = "gray".to_string();
        assert_eq!(cmd.frame_size(), 1280 * 720);

        cmd.input_pixel_format = "bgra".to_string();
        assert_eq!(cmd.frame_size(), 1280 * 720 * 4);
    }

    #[test]
    fn args_carry_container_flags() {
        let args = EncoderCommand::new(640, 480, 30).args();
        assert!(args.contains("-f rawvideo"));
        assert!(args.contains("-video_size 640x480"));
        assert!(args.contains("-f flv"));
        assert!(args.contains("-flvflags no_sequence_end+no_metadata+no_duration_filesize"));
        assert!(args.contains("-bsf:v dump_extra"));
        assert!(args.ends_with("pipe:"));
    }

    #[test]
    fn args_split_into_clean_tokens() {
        let args = EncoderCommand::new(640, 480, 30).args();
        let tokens: Vec<&str> = args.split_whitespace().collect();
        assert!(tokens.iter().all(|t| !t.is_empty()));
        // Two `pipe:` endpoints: raw input and container output.
        assert_eq!(tokens.iter().filter(|t| **t == "pipe:").count(), 2);
    }

    #[test]
    fn x264_params_are_optional() {
        let mut cmd = EncoderCommand::new(640, 480, 30);
        cmd.x264_params = None;
        cmd.gop = 25;
        cmd.bframes = 3;
        let args = cmd.args();
        assert!(!args.contains("-x264-params"));
        assert!(args.contains("-g 25 -bf 3"));
    }
}
