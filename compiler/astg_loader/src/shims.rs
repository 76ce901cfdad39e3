//! Built-in declarations for standard library packages.
//!
//! Used when no `GOROOT` is available so common capabilities
//! (`context.Context`, `io.Reader`, `json.Marshaler`, ...) always resolve.
//! Only declarations are provided; bodies are empty.

const CONTEXT: &str = r#"package context

import "time"

// A Context carries a deadline, a cancellation signal, and other values
// across API boundaries.
type Context interface {
	Deadline() (deadline time.Time, ok bool)
	Done() <-chan struct{}
	Err() error
	Value(key any) any
}

type CancelFunc func()
"#;

const IO: &str = r#"package io

type Reader interface {
	Read(p []byte) (n int, err error)
}

type Writer interface {
	Write(p []byte) (n int, err error)
}

type Closer interface {
	Close() error
}

type Seeker interface {
	Seek(offset int64, whence int) (int64, error)
}

type ReadCloser interface {
	Reader
	Closer
}

type WriteCloser interface {
	Writer
	Closer
}

type ReadWriter interface {
	Reader
	Writer
}

type ReadWriteCloser interface {
	Reader
	Writer
	Closer
}

type ReadSeeker interface {
	Reader
	Seeker
}

type ReaderAt interface {
	ReadAt(p []byte, off int64) (n int, err error)
}

type WriterTo interface {
	WriteTo(w Writer) (n int64, err error)
}

type ReaderFrom interface {
	ReadFrom(r Reader) (n int64, err error)
}

type StringWriter interface {
	WriteString(s string) (n int, err error)
}

type ByteReader interface {
	ReadByte() (byte, error)
}
"#;

const ERRORS: &str = r#"package errors

func New(text string) error

func Is(err, target error) bool

func As(err error, target any) bool

func Unwrap(err error) error

func Join(errs ...error) error
"#;

const FMT: &str = r#"package fmt

type Stringer interface {
	String() string
}

type GoStringer interface {
	GoString() string
}

type State interface {
	Write(b []byte) (n int, err error)
	Width() (wid int, ok bool)
	Precision() (prec int, ok bool)
	Flag(c int) bool
}

type Formatter interface {
	Format(f State, verb rune)
}

func Errorf(format string, a ...any) error

func Sprintf(format string, a ...any) string
"#;

const TIME: &str = r#"package time

type Time struct {
	wall uint64
	ext  int64
	loc  *Location
}

func (t Time) String() string
func (t Time) MarshalJSON() ([]byte, error)
func (t *Time) UnmarshalJSON(data []byte) error
func (t Time) MarshalText() ([]byte, error)
func (t *Time) UnmarshalText(data []byte) error
func (t Time) MarshalBinary() ([]byte, error)
func (t *Time) UnmarshalBinary(data []byte) error

type Duration int64

func (d Duration) String() string

type Month int

func (m Month) String() string

type Weekday int

func (d Weekday) String() string

type Location struct {
	name string
}

func (l *Location) String() string
"#;

const ENCODING: &str = r#"package encoding

type BinaryMarshaler interface {
	MarshalBinary() (data []byte, err error)
}

type BinaryUnmarshaler interface {
	UnmarshalBinary(data []byte) error
}

type TextMarshaler interface {
	MarshalText() (text []byte, err error)
}

type TextUnmarshaler interface {
	UnmarshalText(text []byte) error
}
"#;

const ENCODING_JSON: &str = r#"package json

type Marshaler interface {
	MarshalJSON() ([]byte, error)
}

type Unmarshaler interface {
	UnmarshalJSON([]byte) error
}

type RawMessage []byte

func (m RawMessage) MarshalJSON() ([]byte, error)
func (m *RawMessage) UnmarshalJSON(data []byte) error

type Number string

func (n Number) String() string
"#;

const DATABASE_SQL: &str = r#"package sql

import (
	"database/sql/driver"
	"time"
)

type Scanner interface {
	Scan(src any) error
}

type NullString struct {
	String string
	Valid  bool
}

func (ns *NullString) Scan(value any) error
func (ns NullString) Value() (driver.Value, error)

type NullInt64 struct {
	Int64 int64
	Valid bool
}

func (n *NullInt64) Scan(value any) error
func (n NullInt64) Value() (driver.Value, error)

type NullInt32 struct {
	Int32 int32
	Valid bool
}

func (n *NullInt32) Scan(value any) error
func (n NullInt32) Value() (driver.Value, error)

type NullInt16 struct {
	Int16 int16
	Valid bool
}

func (n *NullInt16) Scan(value any) error
func (n NullInt16) Value() (driver.Value, error)

type NullByte struct {
	Byte  byte
	Valid bool
}

func (n *NullByte) Scan(value any) error
func (n NullByte) Value() (driver.Value, error)

type NullFloat64 struct {
	Float64 float64
	Valid   bool
}

func (n *NullFloat64) Scan(value any) error
func (n NullFloat64) Value() (driver.Value, error)

type NullBool struct {
	Bool  bool
	Valid bool
}

func (n *NullBool) Scan(value any) error
func (n NullBool) Value() (driver.Value, error)

type NullTime struct {
	Time  time.Time
	Valid bool
}

func (n *NullTime) Scan(value any) error
func (n NullTime) Value() (driver.Value, error)
"#;

const DATABASE_SQL_DRIVER: &str = r#"package driver

type Value any

type Valuer interface {
	Value() (Value, error)
}
"#;

const NET: &str = r#"package net

type Addr interface {
	Network() string
	String() string
}

type IP []byte

func (ip IP) String() string
func (ip IP) MarshalText() ([]byte, error)
func (ip *IP) UnmarshalText(text []byte) error

type IPMask []byte

type IPNet struct {
	IP   IP
	Mask IPMask
}

func (n *IPNet) String() string
func (n *IPNet) Network() string
"#;

const SORT: &str = r#"package sort

type Interface interface {
	Len() int
	Less(i, j int) bool
	Swap(i, j int)
}
"#;

const CMP: &str = r#"package cmp

type Ordered interface {
	~int | ~int8 | ~int16 | ~int32 | ~int64 |
		~uint | ~uint8 | ~uint16 | ~uint32 | ~uint64 | ~uintptr |
		~float32 | ~float64 |
		~string
}
"#;

const MIME_MULTIPART: &str = r#"package multipart

import (
	"io"
	"net/textproto"
)

type File interface {
	io.Reader
	io.ReaderAt
	io.Seeker
	io.Closer
}

type FileHeader struct {
	Filename string
	Header   textproto.MIMEHeader
	Size     int64
}

type Part struct {
	Header textproto.MIMEHeader
}

func (p *Part) Read(d []byte) (n int, err error)
func (p *Part) Close() error
func (p *Part) FormName() string
func (p *Part) FileName() string
"#;

const NET_TEXTPROTO: &str = r#"package textproto

type MIMEHeader map[string][]string
"#;

const NET_HTTP: &str = r#"package http

import (
	"io"
	"net/url"
)

type Header map[string][]string

type Cookie struct {
	Name     string
	Value    string
	Path     string
	Domain   string
	MaxAge   int
	Secure   bool
	HttpOnly bool
}

func (c *Cookie) String() string

type Request struct {
	Method string
	URL    *url.URL
	Header Header
	Body   io.ReadCloser
}

type Response struct {
	Status     string
	StatusCode int
	Header     Header
	Body       io.ReadCloser
}

type ResponseWriter interface {
	Header() Header
	Write([]byte) (int, error)
	WriteHeader(statusCode int)
}

type Handler interface {
	ServeHTTP(ResponseWriter, *Request)
}
"#;

const NET_URL: &str = r#"package url

type URL struct {
	Scheme   string
	Host     string
	Path     string
	RawQuery string
}

func (u *URL) String() string

type Values map[string][]string
"#;

/// Source files of a shimmed package, as `(file name, source)` pairs.
pub fn shim_files(pkg_path: &str) -> Option<&'static [(&'static str, &'static str)]> {
    let files: &'static [(&'static str, &'static str)] = match pkg_path {
        "context" => &[("context.go", CONTEXT)],
        "io" => &[("io.go", IO)],
        "errors" => &[("errors.go", ERRORS)],
        "fmt" => &[("print.go", FMT)],
        "time" => &[("time.go", TIME)],
        "encoding" => &[("encoding.go", ENCODING)],
        "encoding/json" => &[("encode.go", ENCODING_JSON)],
        "database/sql" => &[("sql.go", DATABASE_SQL)],
        "database/sql/driver" => &[("types.go", DATABASE_SQL_DRIVER)],
        "net" => &[("net.go", NET)],
        "net/textproto" => &[("header.go", NET_TEXTPROTO)],
        "net/url" => &[("url.go", NET_URL)],
        "sort" => &[("sort.go", SORT)],
        "cmp" => &[("cmp.go", CMP)],
        "mime/multipart" => &[("multipart.go", MIME_MULTIPART)],
        "net/http" => &[("http.go", NET_HTTP)],
        _ => return None,
    };
    Some(files)
}

/// Every shimmed package path.
pub const SHIMMED: &[&str] = &[
    "context",
    "io",
    "errors",
    "fmt",
    "time",
    "encoding",
    "encoding/json",
    "database/sql",
    "database/sql/driver",
    "net",
    "net/textproto",
    "net/url",
    "sort",
    "cmp",
    "mime/multipart",
    "net/http",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn every_shim_parses() {
        for pkg in SHIMMED {
            let files = shim_files(pkg).unwrap_or_default();
            assert!(!files.is_empty(), "{pkg}");
            for (name, source) in files {
                let parsed = astg_syntax::parse_file(Path::new(name), source);
                assert!(parsed.is_ok(), "{pkg}/{name}: {parsed:?}");
            }
        }
    }
}
