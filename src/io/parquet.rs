//! Parquet persistence of patch collections.
//!
//! Geometry is stored as WKB in a `geometry` binary column, attribute columns
//! map onto Utf8 / List<Utf8> / Boolean arrays with nullability marking the
//! optional variants. The frame definition travels in the Arrow schema metadata
//! under `crs`; a GeoParquet `geo` entry is added for other readers.
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use arrow_array::builder::{ListBuilder, StringBuilder};
use arrow_array::cast::AsArray;
use arrow_array::{ArrayRef, BinaryArray, BooleanArray, ListArray, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use gdal::vector::{Geometry as GdalGeometry, ToGdal};
use geo::{Geometry, Polygon};
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::metadata::KeyValue;
use parquet::file::properties::WriterProperties;
use tracing::debug;

use crate::core::collection::{Column, PatchCollection};
use crate::error::{Error, Result};
use crate::types::{Crs, GEOMETRY};

pub const CRS_METADATA_KEY: &str = "crs";
pub const GEO_METADATA_KEY: &str = "geo";

fn label_list_type() -> DataType {
    DataType::List(Arc::new(Field::new("item", DataType::Utf8, true)))
}

fn field_for(name: &str, column: &Column) -> Field {
    match column {
        Column::Text(_) => Field::new(name, DataType::Utf8, false),
        Column::OptionalText(_) => Field::new(name, DataType::Utf8, true),
        Column::Labels(_) => Field::new(name, label_list_type(), false),
        Column::OptionalLabels(_) => Field::new(name, label_list_type(), true),
        Column::Flag(_) => Field::new(name, DataType::Boolean, false),
    }
}

fn label_array<'a>(rows: impl Iterator<Item = Option<&'a Vec<String>>>) -> ListArray {
    let mut builder = ListBuilder::new(StringBuilder::new());
    for row in rows {
        match row {
            Some(labels) => {
                for label in labels {
                    builder.values().append_value(label);
                }
                builder.append(true);
            }
            None => builder.append(false),
        }
    }
    builder.finish()
}

fn encode_column(column: &Column) -> ArrayRef {
    match column {
        Column::Text(values) => Arc::new(StringArray::from_iter_values(values)),
        Column::OptionalText(values) => Arc::new(
            values
                .iter()
                .map(|v| v.as_deref())
                .collect::<StringArray>(),
        ),
        Column::Labels(values) => Arc::new(label_array(values.iter().map(Some))),
        Column::OptionalLabels(values) => Arc::new(label_array(values.iter().map(Option::as_ref))),
        Column::Flag(values) => Arc::new(BooleanArray::from(values.clone())),
    }
}

fn encode_geometry(geometry: &[Polygon<f64>]) -> Result<ArrayRef> {
    let wkb = geometry
        .iter()
        .map(|polygon| Ok(polygon.to_gdal()?.wkb()?))
        .collect::<Result<Vec<Vec<u8>>>>()?;
    Ok(Arc::new(BinaryArray::from_iter_values(wkb)))
}

fn projjson(crs: &Crs) -> Result<serde_json::Value> {
    Ok(serde_json::from_str(&crs.spatial_ref()?.to_projjson()?)?)
}

/// The `crs` member is left out when GDAL cannot express the frame as PROJJSON.
fn geo_metadata(crs: &Crs) -> String {
    let mut column = serde_json::json!({
        "encoding": "WKB",
        "geometry_types": ["Polygon"],
    });
    match projjson(crs) {
        Ok(projjson) => column["crs"] = projjson,
        Err(e) => debug!("No PROJJSON for {}: {}", crs, e),
    }
    serde_json::json!({
        "version": "1.0.0",
        "primary_column": GEOMETRY,
        "columns": { GEOMETRY: column },
    })
    .to_string()
}

/// Write `collection` to `path`, creating parent directories and replacing any
/// existing file.
pub fn write_collection(collection: &PatchCollection, path: &Path) -> Result<()> {
    let mut fields = vec![Field::new(GEOMETRY, DataType::Binary, false)];
    let mut arrays = vec![encode_geometry(collection.geometry())?];
    for (name, column) in collection.columns() {
        fields.push(field_for(name, column));
        arrays.push(encode_column(column));
    }
    let metadata = HashMap::from([(
        CRS_METADATA_KEY.to_string(),
        collection.crs().as_str().to_string(),
    )]);
    let schema = Arc::new(Schema::new_with_metadata(fields, metadata));
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .set_key_value_metadata(Some(vec![KeyValue::new(
            GEO_METADATA_KEY.to_string(),
            geo_metadata(collection.crs()),
        )]))
        .build();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    debug!("Wrote {} rows to {:?}", collection.len(), path);
    Ok(())
}

fn decode_geometry(path: &Path, array: &ArrayRef) -> Result<Vec<Polygon<f64>>> {
    let values = array
        .as_binary_opt::<i32>()
        .ok_or_else(|| Error::malformed(path, "geometry column is not WKB binary"))?;
    values
        .iter()
        .enumerate()
        .map(|(row, wkb)| {
            let wkb = wkb.ok_or_else(|| Error::malformed(path, format!("row {row} has no geometry")))?;
            match GdalGeometry::from_wkb(wkb)?.to_geo()? {
                Geometry::Polygon(polygon) => Ok(polygon),
                other => Err(Error::malformed(
                    path,
                    format!("row {row} holds a {other:?} instead of a polygon"),
                )),
            }
        })
        .collect()
}

fn decode_column(path: &Path, field: &Field, array: &ArrayRef) -> Result<Column> {
    let name = field.name();
    let unsupported = || {
        Error::malformed(
            path,
            format!("column `{}` has unsupported type {}", name, field.data_type()),
        )
    };
    let null = || Error::malformed(path, format!("column `{name}` holds nulls"));
    let strings = |values: ArrayRef| -> Result<Vec<String>> {
        values
            .as_string_opt::<i32>()
            .ok_or_else(unsupported)?
            .iter()
            .map(|v| v.map(str::to_string).ok_or_else(null))
            .collect()
    };

    match field.data_type() {
        DataType::Utf8 => {
            let values = array.as_string_opt::<i32>().ok_or_else(unsupported)?;
            if field.is_nullable() {
                Ok(Column::OptionalText(
                    values.iter().map(|v| v.map(str::to_string)).collect(),
                ))
            } else {
                values
                    .iter()
                    .map(|v| v.map(str::to_string).ok_or_else(null))
                    .collect::<Result<_>>()
                    .map(Column::Text)
            }
        }
        DataType::List(_) => {
            let rows = array
                .as_list_opt::<i32>()
                .ok_or_else(unsupported)?
                .iter()
                .map(|row| row.map(strings).transpose())
                .collect::<Result<Vec<_>>>()?;
            if field.is_nullable() {
                Ok(Column::OptionalLabels(rows))
            } else {
                rows.into_iter()
                    .map(|row| row.ok_or_else(null))
                    .collect::<Result<_>>()
                    .map(Column::Labels)
            }
        }
        DataType::Boolean => array
            .as_boolean_opt()
            .ok_or_else(unsupported)?
            .iter()
            .map(|v| v.ok_or_else(null))
            .collect::<Result<_>>()
            .map(Column::Flag),
        _ => Err(unsupported()),
    }
}

fn decode_batch(path: &Path, crs: &Crs, batch: &RecordBatch) -> Result<PatchCollection> {
    let schema = batch.schema();
    let mut geometry = None;
    let mut columns = Vec::new();
    for (field, array) in schema.fields().iter().zip(batch.columns()) {
        if field.name() == GEOMETRY {
            geometry = Some(decode_geometry(path, array)?);
        } else {
            columns.push((field.name().clone(), decode_column(path, field, array)?));
        }
    }
    let geometry = geometry.ok_or_else(|| Error::MissingColumns {
        missing: vec![GEOMETRY.to_string()],
    })?;
    PatchCollection::new(crs.clone(), geometry, columns)
}

/// Read a collection written by [`write_collection`].
pub fn read_collection(path: &Path) -> Result<PatchCollection> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound {
            path: path.to_path_buf(),
        },
        _ => Error::Io(e),
    })?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| Error::malformed(path, e))?;
    let schema = builder.schema().clone();
    let crs = schema
        .metadata()
        .get(CRS_METADATA_KEY)
        .map(Crs::new)
        .ok_or_else(|| Error::malformed(path, "no `crs` entry in the schema metadata"))?;

    let mut parts = Vec::new();
    for batch in builder.build()? {
        parts.push(decode_batch(path, &crs, &batch?)?);
    }
    if parts.is_empty() {
        parts.push(decode_batch(path, &crs, &RecordBatch::new_empty(schema))?);
    }
    let collection = PatchCollection::concat(parts)?;
    debug!("Read {} rows from {:?}", collection.len(), path);
    Ok(collection)
}
