//! `multipart.go`: streamed multipart request bodies and responses.

use crate::context::RenderContext;
use crate::writer::GoFile;

pub fn multipart_file(ctx: &RenderContext<'_>) -> GoFile {
    let mut file = GoFile::new(&ctx.config.package_name);
    for path in [
        "bytes",
        "fmt",
        "io",
        "mime",
        "mime/multipart",
        "net/http",
        "net/textproto",
        "sync",
        "sync/atomic",
    ] {
        file.imports.add(path);
    }
    file.body.raw(MULTIPART);
    file
}

const MULTIPART: &str = r#"type multipartPart struct {
	name        string
	contentType string
	reader      io.Reader
}

// newMultipartBody streams fields then parts through a pipe; every call
// uses a fresh boundary.
func newMultipartBody(parts []multipartPart, fields map[string]string) (io.Reader, string) {
	pipeReader, pipeWriter := io.Pipe()
	writer := multipart.NewWriter(pipeWriter)
	go func() {
		for name, value := range fields {
			if err := writer.WriteField(name, value); err != nil {
				pipeWriter.CloseWithError(err)
				return
			}
		}
		for _, part := range parts {
			if part.reader == nil {
				continue
			}
			header := make(textproto.MIMEHeader)
			header.Set("Content-Disposition", fmt.Sprintf(`form-data; name="%s"; filename="%s"`, part.name, part.name))
			header.Set("Content-Type", part.contentType)
			partWriter, err := writer.CreatePart(header)
			if err != nil {
				pipeWriter.CloseWithError(err)
				return
			}
			if _, err = io.Copy(partWriter, part.reader); err != nil {
				pipeWriter.CloseWithError(err)
				return
			}
		}
		pipeWriter.CloseWithError(writer.Close())
	}()
	return pipeReader, writer.FormDataContentType()
}

// sharedCloser closes the response body once every part handed out has
// been closed.
type sharedCloser struct {
	open   int32
	once   sync.Once
	closer io.Closer
}

func (s *sharedCloser) release() error {
	if atomic.AddInt32(&s.open, -1) > 0 {
		return nil
	}
	var err error
	s.once.Do(func() { err = s.closer.Close() })
	return err
}

type partReadCloser struct {
	io.Reader
	shared *sharedCloser
	closed int32
}

func (p *partReadCloser) Close() error {
	if !atomic.CompareAndSwapInt32(&p.closed, 0, 1) {
		return nil
	}
	return p.shared.release()
}

// readMultipart returns the named parts of a multipart response. Parts are
// buffered until the last wanted one, which streams from the body.
func readMultipart(resp *http.Response, names ...string) (map[string]io.ReadCloser, error) {
	_, params, err := mime.ParseMediaType(resp.Header.Get("Content-Type"))
	if err != nil {
		resp.Body.Close()
		return nil, err
	}
	reader := multipart.NewReader(resp.Body, params["boundary"])
	wanted := make(map[string]bool, len(names))
	for _, name := range names {
		wanted[name] = true
	}
	shared := &sharedCloser{open: int32(len(names)), closer: resp.Body}
	parts := make(map[string]io.ReadCloser, len(names))
	for len(wanted) > 0 {
		part, err := reader.NextPart()
		if err != nil {
			resp.Body.Close()
			if err == io.EOF {
				for name := range wanted {
					return nil, fmt.Errorf("multipart response lacks part %q", name)
				}
			}
			return nil, err
		}
		name := part.FormName()
		if !wanted[name] {
			continue
		}
		delete(wanted, name)
		if len(wanted) == 0 {
			parts[name] = &partReadCloser{Reader: part, shared: shared}
			break
		}
		data, err := io.ReadAll(part)
		if err != nil {
			resp.Body.Close()
			return nil, err
		}
		parts[name] = &partReadCloser{Reader: bytes.NewReader(data), shared: shared}
	}
	return parts, nil
}
"#;
