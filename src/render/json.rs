use std::io::Write;

use crate::render::{RenderError, Renderer};
use crate::tracker::Frame;

/// Writes each frame as one JSON document per line.
pub struct JsonWriter<W: Write> {
    out: W,
    pretty: bool,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(out: W, pretty: bool) -> Self {
        Self { out, pretty }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for JsonWriter<W> {
    fn render(&mut self, frame: &Frame) -> Result<(), RenderError> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.out, frame)?;
        } else {
            serde_json::to_writer(&mut self.out, frame)?;
        }
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{predict_trajectory, PropagationError, Subpoint};
    use chrono::{TimeZone, Utc};

    #[test]
    fn writes_frame_as_json_line() {
        let start = Subpoint {
            timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            latitude_deg: 10.0,
            longitude_deg: 179.0,
            altitude_km: 418.0,
        };
        let trajectory = predict_trajectory(start, 2, |at| {
            Ok::<_, PropagationError>(Subpoint {
                timestamp: at,
                longitude_deg: -178.0,
                ..start
            })
        })
        .unwrap();
        let frame = Frame {
            cycle: 3,
            satellite: "ISS (ZARYA)".into(),
            norad_id: 25544,
            current: start,
            trajectory,
        };

        let mut writer = JsonWriter::new(Vec::new(), false);
        writer.render(&frame).unwrap();
        let output = String::from_utf8(writer.into_inner()).unwrap();

        assert_eq!(output.lines().count(), 1);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["cycle"], 3);
        assert_eq!(value["current"]["latitude_deg"], 10.0);
        assert_eq!(value["trajectory"].as_array().unwrap().len(), 3);
        assert_eq!(value["trajectory"][2]["longitude_deg"], 182.0);
        assert_eq!(value["trajectory"][0]["timestamp"], "2024-06-01T00:00:00Z");
    }
}
