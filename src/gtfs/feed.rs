use crate::gtfs::error::{Error, LineError};

use serde::{Deserialize, Deserializer, Serialize};
use std::io::{Cursor, Read, Seek};
use std::{collections::HashSet, fs::File, path::Path, str::FromStr};
use zip::ZipArchive;

/// The one table this service analyzes.
pub const SHAPES_FILE: &str = "shapes.txt";

/// Helper function to deserialize optional fields that might fail to parse
pub fn deserialize_opt<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: FromStr,
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => match T::from_str(&s) {
            Ok(val) => Ok(Some(val)),
            Err(_) => Ok(None), // Instead of failing, just return None
        },
        None => Ok(None),
    }
}

/// Shape points that define the path of a route.
/// https://gtfs.org/documentation/schedule/reference/#shapestxt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapePoint {
    pub shape_id: String,
    pub shape_pt_lat: f64,
    pub shape_pt_lon: f64,
    pub shape_pt_sequence: i32,
    #[serde(default, deserialize_with = "deserialize_opt")]
    pub shape_dist_traveled: Option<f64>,
}

/// GTFS feed reduced to its shape table.
///
/// Other dataset files may be present in the source archive; they are
/// ignored. `shapes.txt` is mandatory here even though the GTFS reference
/// marks it optional, because route geometry is the whole point.
#[derive(Debug, Serialize, Deserialize)]
pub struct Feed {
    pub shape_points: Vec<ShapePoint>,
}

impl Feed {
    /// Reads a feed from a ZIP archive file or an unpacked feed directory.
    pub fn from_path<P>(path: P) -> Result<Feed, Error>
    where
        P: AsRef<Path>,
    {
        let p = path.as_ref();
        if p.is_file() {
            let file = File::open(p).map_err(|e| Error::NamedFileIO {
                file_name: format!("{}", p.display()),
                source: Box::new(e),
            })?;
            Feed::from_zip(file)
        } else if p.is_dir() {
            Feed::read_from_dir(p)
        } else {
            Err(Error::NotFileNorDirectory(format!("{}", p.display())))
        }
    }

    /// Reads a feed from ZIP bytes already in memory (the upload path).
    pub fn from_zip_bytes(bytes: &[u8]) -> Result<Feed, Error> {
        Feed::from_zip(Cursor::new(bytes))
    }

    pub fn print_stats(&self) {
        println!("GTFS feed:");
        println!("  Shape points: {}", self.shape_points.len());
        println!("  Distinct shapes: {}", self.distinct_shape_count());
    }

    pub fn distinct_shape_count(&self) -> usize {
        self.shape_points
            .iter()
            .map(|sp| sp.shape_id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    fn from_zip<R>(reader: R) -> Result<Feed, Error>
    where
        R: Read + Seek,
    {
        let mut archive = ZipArchive::new(reader)?;
        let index = archive
            .index_for_name(SHAPES_FILE)
            .ok_or_else(|| Error::MissingFile(SHAPES_FILE.to_owned()))?;
        let file = archive.by_index(index)?;
        Ok(Feed {
            shape_points: Feed::read_obj(file, SHAPES_FILE)?,
        })
    }

    fn read_from_dir(path: &Path) -> Result<Feed, Error> {
        Ok(Feed {
            shape_points: Feed::read_obj_from_path(path, SHAPES_FILE)?,
        })
    }

    fn read_obj_from_path<O>(path: &Path, file_name: &str) -> Result<Vec<O>, Error>
    where
        for<'de> O: Deserialize<'de>,
    {
        let p = path.join(file_name);
        if p.exists() {
            File::open(p)
                .map_err(|e| Error::NamedFileIO {
                    file_name: file_name.to_owned(),
                    source: Box::new(e),
                })
                .and_then(|r| Feed::read_obj(r, file_name))
        } else {
            Err(Error::MissingFile(file_name.to_owned()))
        }
    }

    fn read_obj<T, O>(mut reader: T, file_name: &str) -> Result<Vec<O>, Error>
    where
        for<'de> O: Deserialize<'de>,
        T: std::io::Read,
    {
        let mut bom = [0; 3];
        reader
            .read_exact(&mut bom)
            .map_err(|e| Error::NamedFileIO {
                file_name: file_name.to_owned(),
                source: Box::new(e),
            })?;

        let chained = if bom != [0xefu8, 0xbbu8, 0xbfu8] {
            bom.chain(reader)
        } else {
            [].chain(reader)
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::None)
            .from_reader(chained);
        // We store the headers to be able to return them in case of errors
        let headers = reader
            .headers()
            .map_err(|e| Error::CSVError {
                file_name: file_name.to_owned(),
                source: e,
                line_in_error: None,
            })?
            .clone()
            .into_iter()
            .map(|x| x.trim())
            .collect::<csv::StringRecord>();

        // Pre-allocate a StringRecord for performance reasons
        let mut rec = csv::StringRecord::new();
        let mut objs = Vec::new();

        // Read each record into the pre-allocated StringRecord one at a time
        while reader.read_record(&mut rec).map_err(|e| Error::CSVError {
            file_name: file_name.to_owned(),
            source: e,
            line_in_error: None,
        })? {
            let obj = rec
                .deserialize(Some(&headers))
                .map_err(|e| Error::CSVError {
                    file_name: file_name.to_owned(),
                    source: e,
                    line_in_error: Some(LineError {
                        headers: headers.into_iter().map(String::from).collect(),
                        values: rec.into_iter().map(String::from).collect(),
                    }),
                })?;
            objs.push(obj);
        }
        Ok(objs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const SHAPES_CSV: &str = "shape_id,shape_pt_lat,shape_pt_lon,shape_pt_sequence\n\
        A,43.6532,-79.3832,1\n\
        A,43.6540,-79.3820,2\n\
        B,43.7000,-79.4000,1\n";

    fn zip_with(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            for (name, body) in entries {
                writer
                    .start_file(*name, SimpleFileOptions::default())
                    .unwrap();
                writer.write_all(body.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn reads_shape_points_from_zip_bytes() {
        let bytes = zip_with(&[(SHAPES_FILE, SHAPES_CSV)]);
        let feed = Feed::from_zip_bytes(&bytes).unwrap();
        assert_eq!(feed.shape_points.len(), 3);
        assert_eq!(feed.distinct_shape_count(), 2);
        let first = &feed.shape_points[0];
        assert_eq!(first.shape_id, "A");
        assert_eq!(first.shape_pt_sequence, 1);
        assert!((first.shape_pt_lat - 43.6532).abs() < 1e-9);
        assert!((first.shape_pt_lon - -79.3832).abs() < 1e-9);
    }

    #[test]
    fn archive_without_shapes_is_missing_file() {
        let bytes = zip_with(&[("stops.txt", "stop_id,stop_name\n1,Main St\n")]);
        let err = Feed::from_zip_bytes(&bytes).unwrap_err();
        match err {
            Error::MissingFile(name) => assert_eq!(name, SHAPES_FILE),
            other => panic!("expected MissingFile, got {other:?}"),
        }
    }

    #[test]
    fn tolerates_utf8_bom_and_padded_headers() {
        let body = "\u{feff}shape_id, shape_pt_lat ,shape_pt_lon,shape_pt_sequence\nA,1.0,2.0,1\n";
        let bytes = zip_with(&[(SHAPES_FILE, body)]);
        let feed = Feed::from_zip_bytes(&bytes).unwrap();
        assert_eq!(feed.shape_points.len(), 1);
        assert!((feed.shape_points[0].shape_pt_lat - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unparseable_dist_traveled_becomes_none() {
        let body = "shape_id,shape_pt_lat,shape_pt_lon,shape_pt_sequence,shape_dist_traveled\n\
            A,1.0,2.0,1,not-a-number\n\
            A,1.1,2.1,2,15.5\n";
        let bytes = zip_with(&[(SHAPES_FILE, body)]);
        let feed = Feed::from_zip_bytes(&bytes).unwrap();
        assert_eq!(feed.shape_points[0].shape_dist_traveled, None);
        assert_eq!(feed.shape_points[1].shape_dist_traveled, Some(15.5));
    }

    #[test]
    fn malformed_row_reports_offending_line() {
        let body = "shape_id,shape_pt_lat,shape_pt_lon,shape_pt_sequence\n\
            A,not-a-latitude,2.0,1\n";
        let bytes = zip_with(&[(SHAPES_FILE, body)]);
        let err = Feed::from_zip_bytes(&bytes).unwrap_err();
        match err {
            Error::CSVError {
                file_name,
                line_in_error: Some(line),
                ..
            } => {
                assert_eq!(file_name, SHAPES_FILE);
                assert_eq!(line.values[1], "not-a-latitude");
            }
            other => panic!("expected CSVError with line, got {other:?}"),
        }
    }

    #[test]
    fn reads_feed_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SHAPES_FILE), SHAPES_CSV).unwrap();
        let feed = Feed::from_path(dir.path()).unwrap();
        assert_eq!(feed.shape_points.len(), 3);
    }

    #[test]
    fn directory_without_shapes_is_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Feed::from_path(dir.path()).unwrap_err();
        assert!(matches!(err, Error::MissingFile(_)));
    }
}
