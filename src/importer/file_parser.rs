// ==========================================
// 库存对账同步 - 文件解析器实现
// ==========================================
// 阶段 0: 上传字节 → 第一个工作表 → 行记录（列名 → 单元格）
// 支持: Excel (.xlsx/.xls/.ods) / CSV (.csv)
// 约束: 仅读取第一个工作表；列名统一小写 + 去首尾空白
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::row_importer_trait::FileParser;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::io::Cursor;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE2_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

// ==========================================
// CellValue - 单元格值
// ==========================================
// 数值单元格与文本单元格分开保留，数量解析规则依赖此区分
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// 文本视图：去首尾空白，空值返回 None
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }

    pub fn is_blank(&self) -> bool {
        self.as_text().is_none()
    }
}

/// 整数值的数字单元格按整数输出（条码/SKU 常以数字存储）
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// ==========================================
// RawRecord - 原始行记录
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub row_number: usize, // 表格行号（表头=1）
    pub cells: HashMap<String, CellValue>,
}

impl RawRecord {
    /// 按规范化列名取值
    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.cells.get(&normalize_header(header))
    }
}

/// 列名规范化：去首尾空白 + 小写
pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

/// 根据表头和单元格序列组装行记录；完全空白的行返回 None
fn build_record(
    headers: &[String],
    cells: impl Iterator<Item = CellValue>,
    row_number: usize,
) -> Option<RawRecord> {
    let mut map = HashMap::new();
    for (col_idx, value) in cells.enumerate() {
        if let Some(header) = headers.get(col_idx) {
            if header.is_empty() {
                continue;
            }
            // 重名列保留第一个非空值
            let keep_existing = map
                .get(header)
                .map(|existing: &CellValue| !existing.is_blank())
                .unwrap_or(false);
            if !keep_existing {
                map.insert(header.clone(), value);
            }
        }
    }

    // 跳过完全空白的行
    if map.values().all(|v| v.is_blank()) {
        return None;
    }

    Some(RawRecord {
        row_number,
        cells: map,
    })
}

// ==========================================
// 文件格式识别
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Workbook,
}

/// 依据文件头魔数识别格式，文件名扩展名作为补充提示
pub fn detect_format(bytes: &[u8], file_name: Option<&str>) -> ImportResult<FileFormat> {
    if bytes.is_empty() {
        return Err(ImportError::EmptyFile);
    }
    if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE2_MAGIC) {
        return Ok(FileFormat::Workbook);
    }

    let ext = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(FileFormat::Workbook),
        "csv" | "txt" | "" => {
            let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
            if std::str::from_utf8(body).is_ok() {
                Ok(FileFormat::Csv)
            } else {
                Err(ImportError::UnsupportedFormat(
                    "无法识别的二进制内容".to_string(),
                ))
            }
        }
        other => Err(ImportError::UnsupportedFormat(other.to_string())),
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_records(&self, bytes: &[u8]) -> ImportResult<Vec<RawRecord>> {
        let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(body);

        // 读取表头
        let header_record = reader.headers()?.clone();
        let headers: Vec<String> = header_record.iter().map(normalize_header).collect();

        // csv 读取器会跳过纯空行；行号按物理行推算，引号内换行不计为新行
        let mut row_number = 1;
        let mut last_line =
            record_line(&header_record).unwrap_or(1) + embedded_newlines(&header_record);

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            match record_line(&record) {
                Some(line) => {
                    row_number += line.saturating_sub(last_line).max(1) as usize;
                    last_line = line + embedded_newlines(&record);
                }
                None => row_number += 1,
            }
            let cells = record.iter().map(|v| CellValue::Text(v.to_string()));
            if let Some(raw) = build_record(&headers, cells, row_number) {
                records.push(raw);
            }
        }

        Ok(records)
    }
}

fn record_line(record: &StringRecord) -> Option<u64> {
    record.position().map(|pos| pos.line())
}

fn embedded_newlines(record: &StringRecord) -> u64 {
    record
        .iter()
        .map(|field| field.matches('\n').count() as u64)
        .sum()
}

// ==========================================
// Excel Parser 实现（xlsx/xls/xlsb/ods 自动识别）
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_to_raw_records(&self, bytes: &[u8]) -> ImportResult<Vec<RawRecord>> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

        // 读取第一个 sheet；无工作表视为空表
        let range = match workbook.worksheet_range_at(0) {
            Some(range) => range?,
            None => return Ok(Vec::new()),
        };

        // 表头所在的绝对行号（range 可能不从 A1 开始）
        let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);

        // 提取表头（第一行）
        let mut rows = range.rows();
        let header_row = match rows.next() {
            Some(row) => row,
            None => return Ok(Vec::new()),
        };
        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| normalize_header(&cell.to_string()))
            .collect();

        // 读取数据行
        let mut records = Vec::new();
        for (idx, data_row) in rows.enumerate() {
            let row_number = first_row + idx + 2;
            let cells = data_row.iter().map(convert_cell);
            if let Some(raw) = build_record(&headers, cells, row_number) {
                records.push(raw);
            }
        }

        Ok(records)
    }
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        other => CellValue::Text(other.to_string()),
    }
}

// ==========================================
// 通用文件解析器（根据内容自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse(&self, bytes: &[u8], file_name: Option<&str>) -> ImportResult<Vec<RawRecord>> {
        match detect_format(bytes, file_name)? {
            FileFormat::Csv => CsvParser.parse_to_raw_records(bytes),
            FileFormat::Workbook => ExcelParser.parse_to_raw_records(bytes),
        }
    }
}
