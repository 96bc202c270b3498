//! Motion-compensated frame reprojection
//!
//! Holds the two most recent rendered frames, estimates per-block motion
//! between them, and can synthesize a warped frame plus extrapolated pose
//! for a display deadline that falls after the next real frame would be
//! ready. A per-tick admission check decides, as late as possible before
//! the deadline, whether to submit the extrapolated frame instead of
//! waiting for the pipeline.

use crate::constants::{MICROS_PER_SEC, REPROJECT_LOOKAHEAD_US, WARMUP_FRAMES};
use crate::pose::Pose;
use crate::render::{RenderBackend, TextureDesc, TextureFormat, TextureId};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Static parameters for the reprojection engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReprojectorConfig {
    /// Per-eye render width in pixels; textures span both eyes side by side
    pub eye_width: u32,
    /// Render height in pixels
    pub eye_height: u32,
    /// Display refresh rate in Hz
    pub refresh_rate: f32,
}

impl ReprojectorConfig {
    fn frame_interval_us(&self) -> u64 {
        (MICROS_PER_SEC as f32 / self.refresh_rate) as u64
    }
}

/// One entry of the two-frame ring
#[derive(Debug, Clone, Copy)]
struct FrameSlot {
    color: TextureId,
    luminance: TextureId,
    pose: Pose,
    render_time: u64,
}

/// Reprojection engine; single render thread only
///
/// The ring is an explicit two-element array with a toggled index: the slot
/// at `target_idx` is the latest frame, the other slot is the
/// motion-estimation reference.
pub struct Reprojector<B: RenderBackend> {
    backend: B,
    slots: [FrameSlot; 2],
    target_idx: usize,
    motion_supported: bool,
    motion_vectors: TextureId,
    output_texture: TextureId,
    output_pose: Pose,
    output_valid: bool,
    empty_frames: u32,
    frame_sent: bool,
    frame_interval: u64,
    display_time: u64,
    last_submit_time: u64,
}

impl<B: RenderBackend> Reprojector<B> {
    /// Allocate engine textures and resolve the motion-estimation capability
    pub fn new(mut backend: B, config: ReprojectorConfig) -> Self {
        let luminance_desc = TextureDesc {
            width: config.eye_width * 2,
            height: config.eye_height,
            format: TextureFormat::R8,
        };
        let lum0 = backend.create_texture(luminance_desc);
        let lum1 = backend.create_texture(luminance_desc);

        let motion_vectors = backend.create_texture(TextureDesc {
            width: config.eye_width * 2,
            height: config.eye_height,
            format: TextureFormat::Rgba16F,
        });
        let output_texture = backend.create_texture(TextureDesc {
            width: config.eye_width * 2,
            height: config.eye_height,
            format: TextureFormat::Rgb8,
        });

        let motion_supported = backend.supports_motion_estimation();
        #[cfg(feature = "logging")]
        if !motion_supported {
            debug!("motion estimation unavailable; warping with a zero motion field");
        }

        // `color` holds the caller's frame texture once the first frame
        // lands; until warm-up completes the slots are never sampled.
        let slots = [
            FrameSlot {
                color: lum0,
                luminance: lum0,
                pose: Pose::default(),
                render_time: 0,
            },
            FrameSlot {
                color: lum1,
                luminance: lum1,
                pose: Pose::default(),
                render_time: 0,
            },
        ];

        Self {
            backend,
            slots,
            target_idx: 0,
            motion_supported,
            motion_vectors,
            output_texture,
            output_pose: Pose::default(),
            output_valid: false,
            empty_frames: WARMUP_FRAMES,
            frame_sent: false,
            frame_interval: config.frame_interval_us(),
            display_time: 0,
            last_submit_time: 0,
        }
    }

    /// Whether two real frames have been observed
    pub fn warmed_up(&self) -> bool {
        self.empty_frames == 0
    }

    /// Ingest a freshly rendered frame
    ///
    /// Toggling the ring index demotes the previous target to the
    /// motion-estimation reference; the new frame's luminance is rendered
    /// into the freed slot.
    pub fn add_frame(&mut self, frame: TextureId, pose: Pose, render_time: u64) {
        self.target_idx ^= 1;
        let slot = &mut self.slots[self.target_idx];
        slot.color = frame;
        slot.pose = pose;
        slot.render_time = render_time;
        self.backend.luminance(frame, slot.luminance);

        if self.empty_frames > 0 {
            self.empty_frames -= 1;
        }
    }

    /// Run block motion estimation between the two ring frames
    ///
    /// No-op during warm-up or when the hardware primitive is absent (the
    /// motion field then stays zero and reprojection degrades to pure pose
    /// extrapolation).
    pub fn estimate_motion(&mut self) {
        if !self.warmed_up() || !self.motion_supported {
            return;
        }
        let reference = self.slots[self.target_idx ^ 1].luminance;
        let target = self.slots[self.target_idx].luminance;
        self.backend.estimate_motion(reference, target, self.motion_vectors);
    }

    /// Synthesize the warped frame and extrapolated pose for `display_time`
    ///
    /// The magnitude is the fraction of one inter-frame interval by which
    /// `display_time` lies past the target frame. Identical ring timestamps
    /// would divide by zero; the magnitude is clamped to zero instead, so
    /// the output equals the target frame. No-op during warm-up.
    pub fn reproject(&mut self, display_time: u64) {
        if !self.warmed_up() {
            return;
        }
        let target = self.slots[self.target_idx];
        let reference = self.slots[self.target_idx ^ 1];

        let magnitude = if target.render_time <= reference.render_time {
            0.0
        } else {
            let interval = (target.render_time - reference.render_time) as f32;
            (display_time as i64 - target.render_time as i64) as f32 / interval
        };

        self.backend
            .warp(target.color, self.motion_vectors, magnitude, self.output_texture);
        self.output_pose = Pose::extrapolate(&reference.pose, &target.pose, 1.0 + magnitude);
        self.output_valid = true;

        #[cfg(feature = "logging")]
        trace!(magnitude, display_time, "reprojected frame");
    }

    /// Per-tick admission decision
    ///
    /// Submits at most once per display interval: when warm-up is done, no
    /// frame has been sent for this interval yet, and the deadline is within
    /// the lookahead window, the extrapolated frame is synthesized and
    /// `true` is returned. Waiting until the window opens gives a real frame
    /// every chance to arrive first.
    pub fn check(&mut self, now: u64) -> bool {
        if !self.warmed_up() || self.frame_sent {
            return false;
        }
        if self.display_time.saturating_sub(now) < REPROJECT_LOOKAHEAD_US {
            self.reproject(self.display_time);
            self.frame_sent = true;
            return true;
        }
        false
    }

    /// Whether a frame has been submitted for the current interval
    pub fn frame_sent(&self) -> bool {
        self.frame_sent
    }

    /// Latch the current interval as submitted (a real frame made it)
    pub fn mark_frame_sent(&mut self) {
        self.frame_sent = true;
    }

    /// Begin the next display interval at `now`
    ///
    /// Recomputes the deadline one frame interval ahead and clears the
    /// submission latch.
    pub fn reset_frame_sent(&mut self, now: u64) {
        self.display_time = now + self.frame_interval;
        self.last_submit_time = now;
        self.frame_sent = false;
    }

    /// Warped output texture and extrapolated pose
    ///
    /// Valid only after a successful (non-warm-up) [`reproject`](Self::reproject).
    pub fn output(&self) -> Option<(TextureId, Pose)> {
        self.output_valid.then_some((self.output_texture, self.output_pose))
    }

    /// Display interval in microseconds
    pub fn frame_interval(&self) -> u64 {
        self.frame_interval
    }

    /// Deadline of the current display interval
    pub fn display_time(&self) -> u64 {
        self.display_time
    }

    /// Start of the current display interval
    pub fn last_submit_time(&self) -> u64 {
        self.last_submit_time
    }

    /// The render backend the engine was constructed with
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the render backend
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
