use std::collections::HashMap;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::assets::AssetCatalog;
use crate::audio::{EngineCommand, SampleBuffer};
use crate::audio_api::{AudioCommand, AudioEvent};
use crate::error::Result;
use crate::shared::Channel;

/// Decodes asset urls into output-rate buffers. The short rain, crowd and
/// thunder clips are cached by url; music tracks are decoded fresh each time
/// and only live as long as the voice playing them.
pub struct AssetLoader {
    catalog: AssetCatalog,
    sample_rate: u32,
    cache: HashMap<String, Arc<SampleBuffer>>,
}

impl AssetLoader {
    pub fn new(catalog: AssetCatalog, sample_rate: u32) -> Self {
        Self { catalog, sample_rate, cache: HashMap::new() }
    }

    pub fn fetch(&mut self, url: &str) -> Result<Arc<SampleBuffer>> {
        if let Some(buffer) = self.cache.get(url) {
            return Ok(Arc::clone(buffer));
        }
        let buffer = self.decode(url)?;
        self.cache.insert(url.to_owned(), Arc::clone(&buffer));
        Ok(buffer)
    }

    fn decode(&self, url: &str) -> Result<Arc<SampleBuffer>> {
        let path = self.catalog.resolve(url);
        let buffer = Arc::new(SampleBuffer::load(&path, self.sample_rate)?);
        tracing::debug!(url, frames = buffer.len(), "decoded asset");
        Ok(buffer)
    }

    // full-length tracks stay out of the cache
    fn load_for(&mut self, channel: Channel, url: &str) -> Result<Arc<SampleBuffer>> {
        match channel {
            Channel::Music => self.decode(url),
            Channel::Rain | Channel::Thunder | Channel::Crowd => self.fetch(url),
        }
    }

    // Everything passes through in order, so a Play queued behind a Load
    // reaches the engine after the buffer is attached.
    pub fn translate(
        &mut self,
        cmd: AudioCommand,
        events_tx: &Sender<AudioEvent>,
    ) -> EngineCommand {
        match cmd {
            AudioCommand::Load { channel, url } => match self.load_for(channel, &url) {
                Ok(buffer) => EngineCommand::Attach { channel, buffer },
                Err(e) => {
                    // a missing asset only silences that channel
                    tracing::warn!(
                        channel = channel.label(),
                        %url,
                        error = %e,
                        "could not load audio"
                    );
                    let _ = events_tx.try_send(AudioEvent::PlaybackFailed {
                        channel,
                        url,
                        reason: e.to_string(),
                    });
                    EngineCommand::Detach(channel)
                }
            },
            other => EngineCommand::Control(other),
        }
    }
}

/// Runs until the controller side of `commands` is dropped.
pub fn spawn_loader(
    mut loader: AssetLoader,
    commands: Receiver<AudioCommand>,
    engine_tx: Sender<EngineCommand>,
    events_tx: Sender<AudioEvent>,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new().name("ambience-loader".into()).spawn(move || {
        for cmd in commands.iter() {
            let engine_cmd = loader.translate(cmd, &events_tx);
            if engine_tx.send(engine_cmd).is_err() {
                break; // audio stream is gone
            }
        }
        tracing::debug!("asset loader stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(dir: &std::path::Path, name: &str) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(dir.join(name), spec).unwrap();
        for s in [0i16, 1000, 2000, 3000] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn setup(tag: &str) -> (std::path::PathBuf, AssetLoader) {
        let root = std::env::temp_dir()
            .join(format!("chatkada-loader-{}-{}", tag, std::process::id()));
        let sounds = root.join("chatkada").join("sounds");
        std::fs::create_dir_all(&sounds).unwrap();
        write_wav(&sounds, "tick.wav");
        let loader = AssetLoader::new(AssetCatalog::new("chatkada", &root), 8000);
        (root, loader)
    }

    #[test]
    fn fetch_caches_by_url() {
        let (root, mut loader) = setup("cache");
        let a = loader.fetch("/static/chatkada/sounds/tick.wav").unwrap();
        let b = loader.fetch("/static/chatkada/sounds/tick.wav").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.len(), 4);
        let _ = std::fs::remove_dir_all(root);
    }

    fn load(channel: Channel, file: &str) -> AudioCommand {
        AudioCommand::Load { channel, url: format!("/static/chatkada/sounds/{file}") }
    }

    #[test]
    fn music_tracks_are_not_kept_after_handoff() {
        let (root, mut loader) = setup("music");
        write_wav(&root.join("chatkada").join("sounds"), "song-a.wav");
        write_wav(&root.join("chatkada").join("sounds"), "song-b.wav");
        let (tx, _rx) = crossbeam_channel::unbounded();

        for file in ["song-a.wav", "song-b.wav", "song-a.wav"] {
            let out = loader.translate(load(Channel::Music, file), &tx);
            let EngineCommand::Attach { buffer, .. } = out else {
                panic!("music load failed for {file}");
            };
            // the engine's handle is the only one left
            assert_eq!(Arc::strong_count(&buffer), 1);
        }
        assert!(loader.cache.is_empty());
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn short_clips_are_decoded_once() {
        let (root, mut loader) = setup("clips");
        let (tx, _rx) = crossbeam_channel::unbounded();
        let first = loader.translate(load(Channel::Rain, "tick.wav"), &tx);
        let second = loader.translate(load(Channel::Rain, "tick.wav"), &tx);
        match (first, second) {
            (EngineCommand::Attach { buffer: a, .. }, EngineCommand::Attach { buffer: b, .. }) => {
                assert!(Arc::ptr_eq(&a, &b));
            }
            other => panic!("expected two attaches, got {other:?}"),
        }
        assert_eq!(loader.cache.len(), 1);
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn failed_load_detaches_and_reports() {
        let (root, mut loader) = setup("missing");
        let (tx, rx) = crossbeam_channel::unbounded();
        let cmd = AudioCommand::Load {
            channel: Channel::Crowd,
            url: "/static/chatkada/sounds/nope.mp3".into(),
        };
        let out = loader.translate(cmd, &tx);
        assert!(matches!(out, EngineCommand::Detach(Channel::Crowd)));
        assert!(matches!(
            rx.try_recv(),
            Ok(AudioEvent::PlaybackFailed { channel: Channel::Crowd, .. })
        ));
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn thread_preserves_command_order() {
        let (root, loader) = setup("order");
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
        let (engine_tx, engine_rx) = crossbeam_channel::unbounded();
        let (events_tx, _events_rx) = crossbeam_channel::unbounded();
        let handle = spawn_loader(loader, cmd_rx, engine_tx, events_tx).unwrap();

        let url = "/static/chatkada/sounds/tick.wav".to_string();
        cmd_tx.send(AudioCommand::Load { channel: Channel::Rain, url }).unwrap();
        cmd_tx.send(AudioCommand::Play(Channel::Rain)).unwrap();
        drop(cmd_tx);
        handle.join().unwrap();

        let got: Vec<EngineCommand> = engine_rx.try_iter().collect();
        assert_eq!(got.len(), 2);
        assert!(matches!(got[0], EngineCommand::Attach { channel: Channel::Rain, .. }));
        assert!(matches!(got[1], EngineCommand::Control(AudioCommand::Play(Channel::Rain))));
        let _ = std::fs::remove_dir_all(root);
    }
}
