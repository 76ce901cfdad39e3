//! The generated `jsonrpc` subpackage: envelopes, transport and options.
//!
//! The package is self-contained; only the JSON import varies with the
//! project's `packageJSON` tag.

use crate::context::RenderContext;
use crate::writer::GoFile;

const PACKAGE: &str = "jsonrpc";

/// `types.go`, `client.go` and `options.go` of the subpackage.
pub fn jsonrpc_files(ctx: &RenderContext<'_>) -> Vec<(&'static str, GoFile)> {
    let mut types = GoFile::new(PACKAGE);
    ctx.import_json(&mut types.imports);
    for path in ["fmt", "sync/atomic"] {
        types.imports.add(path);
    }
    types.body.raw(TYPES);

    let mut client = GoFile::new(PACKAGE);
    ctx.import_json(&mut client.imports);
    for path in ["bytes", "context", "crypto/tls", "fmt", "io", "log", "net/http"] {
        client.imports.add(path);
    }
    client.body.raw(CLIENT);

    let mut options = GoFile::new(PACKAGE);
    ctx.import_json(&mut options.imports);
    for path in ["context", "crypto/tls", "net/http"] {
        options.imports.add(path);
    }
    options.body.raw(OPTIONS);

    vec![("types.go", types), ("client.go", client), ("options.go", options)]
}

const TYPES: &str = r#"// Version is the protocol version sent in every envelope.
const Version = "2.0"

// InternalError is the code used when a server error carries none.
const InternalError = -32603

// ID identifies a request within a client process.
type ID uint64

var lastID uint64

// NewID returns the next request id; ids increase monotonically.
func NewID() ID {
	return ID(atomic.AddUint64(&lastID, 1))
}

type RPCRequest struct {
	ID      ID          `json:"id"`
	JSONRPC string      `json:"jsonrpc"`
	Method  string      `json:"method"`
	Params  interface{} `json:"params,omitempty"`
}

// NewRequest builds an envelope with a fresh id.
func NewRequest(method string, params interface{}) *RPCRequest {
	return &RPCRequest{ID: NewID(), JSONRPC: Version, Method: method, Params: params}
}

type RPCRequests []*RPCRequest

type RPCResponse struct {
	ID      ID              `json:"id"`
	JSONRPC string          `json:"jsonrpc"`
	Result  json.RawMessage `json:"result,omitempty"`
	Error   *RPCError       `json:"error,omitempty"`
}

// GetObject decodes the result into target; an absent result is not an error.
func (r *RPCResponse) GetObject(target interface{}) error {
	if len(r.Result) == 0 {
		return nil
	}
	return json.Unmarshal(r.Result, target)
}

type RPCResponses []*RPCResponse

// AsMap indexes responses by request id.
func (responses RPCResponses) AsMap() map[ID]*RPCResponse {
	out := make(map[ID]*RPCResponse, len(responses))
	for _, response := range responses {
		out[response.ID] = response
	}
	return out
}

type RPCError struct {
	Code    int             `json:"code"`
	Message string          `json:"message"`
	Data    json.RawMessage `json:"data,omitempty"`
}

func (e *RPCError) Error() string {
	return fmt.Sprintf("%d: %s", e.Code, e.Message)
}

// ErrorCode reports the numeric code, used by metrics labels.
func (e *RPCError) ErrorCode() int {
	return e.Code
}
"#;

const CLIENT: &str = r#"// Client posts JSON-RPC 2.0 envelopes to one endpoint.
type Client struct {
	endpoint       string
	httpClient     *http.Client
	tlsConfig      *tls.Config
	before         []BeforeRequest
	after          []AfterRequest
	headers        map[string]string
	headersFromCtx []interface{}
	clientID       string
	logRequests    bool
	logOnError     bool
	errorDecoder   ErrorDecoder
}

func NewClient(endpoint string, opts ...Option) *Client {
	c := &Client{
		endpoint:   endpoint,
		httpClient: http.DefaultClient,
		headers:    make(map[string]string),
	}
	for _, opt := range opts {
		opt(c)
	}
	if c.tlsConfig != nil {
		c.httpClient = &http.Client{
			Timeout:   c.httpClient.Timeout,
			Transport: &http.Transport{TLSClientConfig: c.tlsConfig},
		}
	}
	return c
}

// Call sends one request and decodes its result into result.
func (c *Client) Call(ctx context.Context, method string, params interface{}, result interface{}) error {
	request := NewRequest(method, params)
	data, err := c.do(ctx, request)
	if err != nil {
		return err
	}
	var response RPCResponse
	if err = json.Unmarshal(data, &response); err != nil {
		return fmt.Errorf("decode response of %s: %w", method, err)
	}
	if response.Error != nil {
		return c.ResponseError(response.Error)
	}
	return response.GetObject(result)
}

// CallBatch sends requests as one array; responses may arrive in any order.
func (c *Client) CallBatch(ctx context.Context, requests RPCRequests) (RPCResponses, error) {
	data, err := c.do(ctx, requests)
	if err != nil {
		return nil, err
	}
	var responses RPCResponses
	if err = json.Unmarshal(data, &responses); err != nil {
		var single RPCResponse
		if json.Unmarshal(data, &single) == nil && single.Error != nil {
			return nil, c.ResponseError(single.Error)
		}
		return nil, fmt.Errorf("decode batch response: %w", err)
	}
	return responses, nil
}

// ResponseError converts an error envelope, giving the decoder the first
// chance at its data.
func (c *Client) ResponseError(rpcErr *RPCError) error {
	if rpcErr.Code == 0 {
		rpcErr.Code = InternalError
	}
	if c.errorDecoder != nil && len(rpcErr.Data) > 0 {
		if err := c.errorDecoder(rpcErr.Data); err != nil {
			return err
		}
	}
	return rpcErr
}

func (c *Client) do(ctx context.Context, payload interface{}) ([]byte, error) {
	body, err := json.Marshal(payload)
	if err != nil {
		return nil, err
	}
	req, err := http.NewRequestWithContext(ctx, http.MethodPost, c.endpoint, bytes.NewReader(body))
	if err != nil {
		return nil, err
	}
	req.Header.Set("Content-Type", "application/json")
	req.Header.Set("Accept", "application/json")
	for name, value := range c.headers {
		req.Header.Set(name, value)
	}
	for _, key := range c.headersFromCtx {
		if name, ok := key.(string); ok {
			if value := ctx.Value(key); value != nil {
				req.Header.Set(name, fmt.Sprint(value))
			}
		}
	}
	if c.clientID != "" {
		req.Header.Set("X-Client-Id", c.clientID)
	}
	for _, before := range c.before {
		ctx = before(ctx, req)
		req = req.WithContext(ctx)
	}
	if c.logRequests {
		log.Printf("jsonrpc: %s %s", c.endpoint, body)
	}
	resp, err := c.httpClient.Do(req)
	if err != nil {
		if c.logOnError {
			log.Printf("jsonrpc: %s %s: %v", c.endpoint, body, err)
		}
		return nil, err
	}
	defer resp.Body.Close()
	for _, after := range c.after {
		if err = after(ctx, resp); err != nil {
			return nil, err
		}
	}
	data, err := io.ReadAll(resp.Body)
	if err != nil {
		return nil, err
	}
	if resp.StatusCode != http.StatusOK && len(data) == 0 {
		err = fmt.Errorf("jsonrpc: %s: unexpected status %d", c.endpoint, resp.StatusCode)
		if c.logOnError {
			log.Print(err)
		}
		return nil, err
	}
	return data, nil
}
"#;

const OPTIONS: &str = r#"type Option func(c *Client)

// BeforeRequest may replace the request context before sending.
type BeforeRequest func(ctx context.Context, req *http.Request) context.Context

// AfterRequest inspects the raw response; an error aborts the call.
type AfterRequest func(ctx context.Context, resp *http.Response) error

// ErrorDecoder maps the data of an error response to a typed error.
type ErrorDecoder func(data json.RawMessage) error

func HTTPClient(client *http.Client) Option {
	return func(c *Client) {
		c.httpClient = client
	}
}

func TLSConfig(config *tls.Config) Option {
	return func(c *Client) {
		c.tlsConfig = config
	}
}

func Before(fns ...BeforeRequest) Option {
	return func(c *Client) {
		c.before = append(c.before, fns...)
	}
}

func After(fns ...AfterRequest) Option {
	return func(c *Client) {
		c.after = append(c.after, fns...)
	}
}

func Header(name, value string) Option {
	return func(c *Client) {
		c.headers[name] = value
	}
}

// HeadersFromCtx copies context values stored under string keys into
// headers of the same name.
func HeadersFromCtx(keys ...interface{}) Option {
	return func(c *Client) {
		c.headersFromCtx = append(c.headersFromCtx, keys...)
	}
}

func ClientID(id string) Option {
	return func(c *Client) {
		c.clientID = id
	}
}

func LogRequest() Option {
	return func(c *Client) {
		c.logRequests = true
	}
}

func LogOnError() Option {
	return func(c *Client) {
		c.logOnError = true
	}
}

func DecodeError(decoder ErrorDecoder) Option {
	return func(c *Client) {
		c.errorDecoder = decoder
	}
}
"#;
