/// Bytes per sample for signed 16-bit PCM.
pub const BYTES_PER_SAMPLE: usize = 2;

/// Size of the RIFF/WAVE header emitted by [`pcm16_to_wav`].
pub const WAV_HEADER_LEN: usize = 44;

/// Wrap raw PCM s16le mono bytes in a WAV (RIFF) container.
///
/// An odd trailing byte cannot form a 16-bit sample and is dropped.
pub fn pcm16_to_wav(pcm: &[u8], sample_rate: u32) -> Vec<u8> {
    let pcm = if pcm.len() % BYTES_PER_SAMPLE != 0 {
        &pcm[..pcm.len() - 1]
    } else {
        pcm
    };

    // WAV header fields
    let num_channels: u16 = 1;
    let bits_per_sample: u16 = 16;
    let byte_rate: u32 = sample_rate * num_channels as u32 * (bits_per_sample as u32 / 8);
    let block_align: u16 = num_channels * (bits_per_sample / 8);
    let data_size: u32 = pcm.len() as u32;
    let riff_size: u32 = 36 + data_size;

    let mut out = Vec::<u8>::with_capacity(WAV_HEADER_LEN + pcm.len());

    // RIFF header
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&riff_size.to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt chunk
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes()); // fmt chunk size
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&num_channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());
    out.extend_from_slice(pcm);

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn header_declares_exact_payload() {
        let samples: Vec<i16> = (0..220).map(|i| (i * 37) as i16).collect();
        let pcm: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let wav = pcm16_to_wav(&pcm, 44_100);

        assert_eq!(wav.len(), WAV_HEADER_LEN + samples.len() * BYTES_PER_SAMPLE);
        assert_eq!(&wav[..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");

        let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 44_100);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);

        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn odd_length_payload_is_trimmed() {
        let wav = pcm16_to_wav(&[0x01, 0x00, 0x02], 16_000);
        assert_eq!(&wav[..4], b"RIFF");
        assert_eq!(wav.len(), WAV_HEADER_LEN + 2);
        let declared = u32::from_le_bytes(wav[40..44].try_into().unwrap());
        assert_eq!(declared, 2);
    }

    #[test]
    fn empty_payload_still_forms_a_container() {
        let wav = pcm16_to_wav(&[], 22_050);
        assert_eq!(wav.len(), WAV_HEADER_LEN);
        let declared = u32::from_le_bytes(wav[40..44].try_into().unwrap());
        assert_eq!(declared, 0);
    }
}
