//! `client.go` and the per-contract `client-<contract>.go` files.
//!
//! Every contract method becomes a method of `Client<Contract>` taking a
//! context first and returning named results plus `err error`. JSON-RPC
//! contracts also get a `Req<Method>` constructor for the batch harness.
//! Generated locals carry a leading underscore so they never shadow the
//! caller's argument names.

use astg_ir::{Contract, Variable};
use astg_tags::names;

use crate::context::RenderContext;
use crate::exchange::request_literal;
use crate::names::{lower_camel, upper_first};
use crate::plan::{BodyMode, Codec, Mapped, MethodPlan, ResponseMode};
use crate::writer::{quote, CodeWriter, GoFile, Imports};

/// The root client: constructor, options, contract accessors and the HTTP
/// helpers shared by every contract file.
pub fn root_client_file(ctx: &RenderContext<'_>) -> GoFile {
    let mut file = GoFile::new(&ctx.config.package_name);
    let json = ctx.import_json(&mut file.imports);
    for path in ["context", "fmt", "io", "net/http", "strings"] {
        file.imports.add(path);
    }
    let rpc = ctx
        .has_json_rpc()
        .then(|| file.imports.add(&ctx.config.jsonrpc_import()));
    let default_error = ctx
        .project
        .annotations
        .value(names::DEFAULT_ERROR)
        .and_then(|id| ctx.collected.go_name(id))
        .map(str::to_string);

    let w = &mut file.body;
    w.comment(&["ErrorDecoder turns the payload of an error response into an error."]);
    w.line(format!("type ErrorDecoder func(errData {json}.RawMessage) error"));
    w.blank();

    w.open("type Client struct {");
    if let Some(rpc) = &rpc {
        w.line(format!("rpc            *{rpc}.Client"));
        w.line(format!("rpcOptions     []{rpc}.Option"));
    }
    w.line("endpoint       string");
    w.line("clientID       string");
    w.line("httpClient     *http.Client");
    w.line("headersFromCtx []interface{}");
    w.line("errorDecoder   ErrorDecoder");
    w.close("}");
    w.blank();
    w.line("type Option func(cli *Client)");
    w.blank();

    w.comment(&["New returns a client of every contract served at endpoint."]);
    w.open("func New(endpoint string, opts ...Option) *Client {");
    w.open("cli := &Client{");
    w.line("endpoint:   strings.TrimRight(endpoint, \"/\"),");
    w.line("httpClient: http.DefaultClient,");
    if default_error.is_some() {
        w.line("errorDecoder: defaultErrorDecoder,");
    }
    w.close("}");
    w.open("for _, opt := range opts {");
    w.line("opt(cli)");
    w.close("}");
    if let Some(rpc) = &rpc {
        w.open(format!("rpcOptions := []{rpc}.Option{{"));
        w.line(format!("{rpc}.HTTPClient(cli.httpClient),"));
        w.line(format!("{rpc}.HeadersFromCtx(cli.headersFromCtx...),"));
        w.close("}");
        w.open("if cli.clientID != \"\" {");
        w.line(format!("rpcOptions = append(rpcOptions, {rpc}.ClientID(cli.clientID))"));
        w.close("}");
        w.open("if cli.errorDecoder != nil {");
        w.line(format!(
            "rpcOptions = append(rpcOptions, {rpc}.DecodeError({rpc}.ErrorDecoder(cli.errorDecoder)))"
        ));
        w.close("}");
        w.line(format!(
            "cli.rpc = {rpc}.NewClient(cli.endpoint, append(rpcOptions, cli.rpcOptions...)...)"
        ));
    }
    w.line("return cli");
    w.close("}");
    w.blank();

    options(w, rpc.as_deref());

    for contract in &ctx.contracts {
        w.open(format!(
            "func (cli *Client) {}() *Client{} {{",
            contract.name, contract.name
        ));
        w.line(format!("return &Client{}{{Client: cli}}", contract.name));
        w.close("}");
        w.blank();
    }

    http_helpers(w, &json);
    if let Some(name) = default_error {
        w.open(format!("func defaultErrorDecoder(errData {json}.RawMessage) error {{"));
        w.line(format!("decoded := new({name})"));
        w.open(format!("if err := {json}.Unmarshal(errData, decoded); err != nil {{"));
        w.line("return err");
        w.close("}");
        w.open("if err, ok := interface{}(decoded).(error); ok {");
        w.line("return err");
        w.close("}");
        w.open("if err, ok := interface{}(*decoded).(error); ok {");
        w.line("return err");
        w.close("}");
        w.line("return nil");
        w.close("}");
    }
    file
}

fn options(w: &mut CodeWriter, rpc: Option<&str>) {
    w.open("func WithHTTPClient(httpClient *http.Client) Option {");
    w.open("return func(cli *Client) {");
    w.line("cli.httpClient = httpClient");
    w.close("}");
    w.close("}");
    w.blank();
    w.comment(&["ClientID is sent as X-Client-Id and labels metrics."]);
    w.open("func ClientID(id string) Option {");
    w.open("return func(cli *Client) {");
    w.line("cli.clientID = id");
    w.close("}");
    w.close("}");
    w.blank();
    w.comment(&["HeadersFromCtx copies context values stored under string keys into headers."]);
    w.open("func HeadersFromCtx(keys ...interface{}) Option {");
    w.open("return func(cli *Client) {");
    w.line("cli.headersFromCtx = append(cli.headersFromCtx, keys...)");
    w.close("}");
    w.close("}");
    w.blank();
    w.open("func DecodeError(decoder ErrorDecoder) Option {");
    w.open("return func(cli *Client) {");
    w.line("cli.errorDecoder = decoder");
    w.close("}");
    w.close("}");
    w.blank();
    if let Some(rpc) = rpc {
        w.comment(&["RPCOptions are passed to the JSON-RPC transport after the client's own."]);
        w.open(format!("func RPCOptions(opts ...{rpc}.Option) Option {{"));
        w.open("return func(cli *Client) {");
        w.line("cli.rpcOptions = append(cli.rpcOptions, opts...)");
        w.close("}");
        w.close("}");
        w.blank();
    }
}

fn http_helpers(w: &mut CodeWriter, json: &str) {
    w.raw(&format!(
        r#"func (cli *Client) applyHeaders(ctx context.Context, req *http.Request) {{
	for _, key := range cli.headersFromCtx {{
		if name, ok := key.(string); ok {{
			if value := ctx.Value(key); value != nil {{
				req.Header.Set(name, fmt.Sprint(value))
			}}
		}}
	}}
	if cli.clientID != "" {{
		req.Header.Set("X-Client-Id", cli.clientID)
	}}
}}

// errorHTTP is returned for an unexpected status the decoder did not claim.
type errorHTTP struct {{
	StatusCode int
	Body       []byte
}}

func (e errorHTTP) Error() string {{
	return fmt.Sprintf("http status %d: %s", e.StatusCode, e.Body)
}}

func (e errorHTTP) Code() int {{
	return e.StatusCode
}}

// httpError consumes and closes the body of a failed response.
func (cli *Client) httpError(resp *http.Response) error {{
	defer resp.Body.Close()
	body, _ := io.ReadAll(resp.Body)
	if cli.errorDecoder != nil && len(body) > 0 {{
		if err := cli.errorDecoder({json}.RawMessage(body)); err != nil {{
			return err
		}}
	}}
	return errorHTTP{{StatusCode: resp.StatusCode, Body: body}}
}}
"#
    ));
    w.blank();
}

/// `client-<contract>.go`.
pub fn contract_client_file(ctx: &RenderContext<'_>, contract: &Contract) -> GoFile {
    let mut file = GoFile::new(&ctx.config.package_name);
    file.imports.add("context");
    let client = format!("Client{}", contract.name);
    file.body.open(format!("type {client} struct {{"));
    file.body.line("*Client");
    file.body.close("}");
    file.body.blank();

    let metrics = ctx.metrics_for(contract);
    for plan in ctx.plans(contract) {
        let mut emitter = MethodEmitter {
            ctx,
            plan: &plan,
            imports: &mut file.imports,
            w: &mut file.body,
            client: &client,
            metrics,
        };
        if contract.is_json_rpc() {
            emitter.json_rpc_method();
            emitter.batch_request();
        } else {
            emitter.http_method();
        }
    }
    file
}

/// Method name, named parameters and named results, as declared on the
/// generated client: `Get(ctx context.Context, id UserID) (user *User, err error)`.
pub fn signature(ctx: &RenderContext<'_>, plan: &MethodPlan<'_>, imports: &mut Imports) -> String {
    let types = ctx.types();
    let mut params = vec!["ctx context.Context".to_string()];
    params.extend(
        plan.method
            .wire_args()
            .iter()
            .map(|v| format!("{} {}", v.name, types.param(&v.type_ref, imports))),
    );
    format!(
        "{}({}) ({})",
        plan.method.name,
        params.join(", "),
        results(ctx, plan.method.wire_results(), imports).join(", ")
    )
}

fn results(ctx: &RenderContext<'_>, vars: &[Variable], imports: &mut Imports) -> Vec<String> {
    let types = ctx.types();
    let mut out: Vec<String> = vars
        .iter()
        .map(|v| format!("{} {}", v.name, types.value(&v.type_ref, imports)))
        .collect();
    out.push("err error".to_string());
    out
}

struct MethodEmitter<'r, 'a> {
    ctx: &'r RenderContext<'a>,
    plan: &'r MethodPlan<'a>,
    imports: &'r mut Imports,
    w: &'r mut CodeWriter,
    client: &'r str,
    metrics: bool,
}

impl MethodEmitter<'_, '_> {
    fn open_method(&mut self) {
        self.w.comment(&self.plan.method.docs);
        let signature = signature(self.ctx, self.plan, self.imports);
        self.w.open(format!("func (cli *{}) {signature} {{", self.client));
        if self.metrics {
            self.imports.add("time");
            self.w.line(format!(
                "defer func(_begin time.Time) {{ observe({}, {}, cli.clientID, err, _begin) }}(time.Now())",
                quote(&lower_camel(&self.plan.contract.name)),
                quote(&lower_camel(&self.plan.method.name)),
            ));
        }
    }

    fn close_method(&mut self) {
        self.w.close("}");
        self.w.blank();
    }

    /// Copy response struct fields into the named results.
    fn assign_results(&mut self, fields: &[&Variable]) {
        for var in fields {
            self.w
                .line(format!("{} = _response.{}", var.name, upper_first(&var.name)));
        }
    }

    fn json_rpc_method(&mut self) {
        self.open_method();
        self.w.line(format!("var _response {}", self.plan.response_type()));
        self.w.open(format!(
            "if err = cli.rpc.Call(ctx, {}, {}, &_response); err != nil {{",
            quote(&self.plan.rpc_name),
            request_literal(self.plan),
        ));
        self.w.line("return");
        self.w.close("}");
        let fields = self.plan.response_fields();
        self.assign_results(&fields);
        self.w.line("return");
        self.close_method();
    }

    /// `Req<Method>`: a batch entry whose callback receives typed results.
    fn batch_request(&mut self) {
        let plan = self.plan;
        let callback = format!("ret{}{}", plan.contract.name, plan.method.name);
        let types = self.ctx.types();
        let callback_params = results(self.ctx, plan.method.wire_results(), self.imports);
        self.w
            .line(format!("type {callback} = func({})", callback_params.join(", ")));
        self.w.blank();

        let mut params = vec![
            "ctx context.Context".to_string(),
            format!("callback {callback}"),
        ];
        params.extend(
            plan.method
                .wire_args()
                .iter()
                .map(|v| format!("{} {}", v.name, types.param(&v.type_ref, self.imports))),
        );
        let rpc = self.imports.add(&self.ctx.config.jsonrpc_import());
        self.w.open(format!(
            "func (cli *{}) Req{}({}) (request RequestRPC) {{",
            self.client,
            plan.method.name,
            params.join(", ")
        ));
        self.w.open("request = RequestRPC{");
        self.w.line(format!(
            "rpcRequest: {rpc}.NewRequest({}, {}),",
            quote(&plan.rpc_name),
            request_literal(plan)
        ));
        if self.metrics {
            self.w.line(format!(
                "service: {},",
                quote(&lower_camel(&plan.contract.name))
            ));
            self.w
                .line(format!("method: {},", quote(&lower_camel(&plan.method.name))));
        }
        self.w.close("}");
        self.w.open("if callback != nil {");
        self.w.open(format!(
            "request.retHandler = func(err error, response *{rpc}.RPCResponse) {{"
        ));
        self.w.line(format!("var _response {}", plan.response_type()));
        self.w.open("if err == nil {");
        self.w.line("err = response.GetObject(&_response)");
        self.w.close("}");
        let mut args: Vec<String> = plan
            .response_fields()
            .iter()
            .map(|v| format!("_response.{}", upper_first(&v.name)))
            .collect();
        args.push("err".to_string());
        self.w.line(format!("callback({})", args.join(", ")));
        self.w.close("}");
        self.w.close("}");
        self.w.line("return");
        self.close_method();
    }

    fn http_method(&mut self) {
        self.open_method();
        self.path();
        self.query();
        let content_type = self.body();

        self.imports.add("net/http");
        let body = if self.plan.body == BodyMode::None { "nil" } else { "_body" };
        self.w.line("var _httpReq *http.Request");
        self.w.open(format!(
            "if _httpReq, err = http.NewRequestWithContext(ctx, {}, cli.endpoint+_path, {body}); err != nil {{",
            quote(&self.plan.verb)
        ));
        self.w.line("return");
        self.w.close("}");
        if !self.plan.query.is_empty() {
            self.w.line("_httpReq.URL.RawQuery = _query.Encode()");
        }
        self.w.line("_httpReq.Header.Set(\"Accept\", \"application/json\")");
        if let Some(content_type) = content_type {
            self.w
                .line(format!("_httpReq.Header.Set(\"Content-Type\", {content_type})"));
        }
        let plan = self.plan;
        for header in &plan.headers {
            let name = quote(&header.name);
            self.set_text(header.var, |value| format!("_httpReq.Header.Set({name}, {value})"));
        }
        for cookie in &plan.cookies {
            let name = quote(&cookie.name);
            self.set_text(cookie.var, |value| {
                format!("_httpReq.AddCookie(&http.Cookie{{Name: {name}, Value: {value}}})")
            });
        }
        self.w.line("cli.applyHeaders(ctx, _httpReq)");

        self.w.line("var _httpResp *http.Response");
        self.w
            .open("if _httpResp, err = cli.httpClient.Do(_httpReq); err != nil {");
        self.w.line("return");
        self.w.close("}");
        let streamed = matches!(
            plan.response,
            ResponseMode::Stream | ResponseMode::Multipart
        );
        if !streamed {
            self.w.line("defer _httpResp.Body.Close()");
        }
        self.w
            .open(format!("if _httpResp.StatusCode != {} {{", plan.success));
        self.w.line("err = cli.httpError(_httpResp)");
        self.w.line("return");
        self.w.close("}");
        self.result_locations(&plan.result_headers, "_httpResp.Header.Get");
        self.result_cookies();
        self.response();
        self.w.line("return");
        self.close_method();
    }

    fn path(&mut self) {
        if self.plan.path_args.is_empty() {
            self.w.line(format!(
                "_path := {}",
                quote(&self.plan.path_format.replace("%%", "%"))
            ));
            return;
        }
        self.imports.add("fmt");
        self.imports.add("net/url");
        let plan = self.plan;
        let mut args = Vec::with_capacity(plan.path_args.len());
        for (i, var) in plan.path_args.iter().enumerate() {
            let (guard, expr) = deref(var);
            let value = self.text_expr(var, &expr);
            match guard {
                // A nil pointer leaves its segment empty.
                Some(guard) => {
                    let segment = format!("_segment{i}");
                    self.w.line(format!("var {segment} string"));
                    self.w.open(format!("if {guard} {{"));
                    self.w.line(format!("{segment} = {value}"));
                    self.w.close("}");
                    args.push(format!("url.PathEscape({segment})"));
                }
                None => args.push(format!("url.PathEscape({value})")),
            }
        }
        self.w.line(format!(
            "_path := fmt.Sprintf({}, {})",
            quote(&self.plan.path_format),
            args.join(", ")
        ));
    }

    fn query(&mut self) {
        if self.plan.query.is_empty() {
            return;
        }
        self.imports.add("net/url");
        self.w.line("_query := url.Values{}");
        let plan = self.plan;
        for Mapped { var, name } in &plan.query {
            if var.type_ref.is_slice || var.type_ref.array_len > 0 {
                self.imports.add("fmt");
                self.w.open(format!("for _, _value := range {} {{", var.name));
                self.w
                    .line(format!("_query.Add({}, fmt.Sprint(_value))", quote(name)));
                self.w.close("}");
            } else {
                let name = quote(name);
                self.set_text(var, |value| format!("_query.Set({name}, {value})"));
            }
        }
    }

    /// Build `_body`; returns the Content-Type expression when a body is sent.
    fn body(&mut self) -> Option<String> {
        let plan = self.plan;
        match &plan.body {
            BodyMode::None => None,
            BodyMode::Encoded(Codec::Form) => {
                self.imports.add("net/url");
                self.imports.add("strings");
                self.w.line("_form := url.Values{}");
                for var in &plan.body_args {
                    let name = quote(&var.name);
                    self.set_text(var, |value| format!("_form.Set({name}, {value})"));
                }
                self.w.line("_body := strings.NewReader(_form.Encode())");
                Some(quote(Codec::Form.mime()))
            }
            BodyMode::Encoded(codec) => {
                self.imports.add("bytes");
                let package = codec.import(plan.json_package, self.imports);
                self.w.line("var _payload []byte");
                self.w.open(format!(
                    "if _payload, err = {package}.Marshal({}); err != nil {{",
                    request_literal(plan)
                ));
                self.w.line("return");
                self.w.close("}");
                self.w.line("_body := bytes.NewReader(_payload)");
                Some(quote(codec.mime()))
            }
            BodyMode::Stream => {
                let part = &plan.parts[0];
                self.w.line(format!("_body := {}", part.var.name));
                Some(quote(&part.content_type))
            }
            BodyMode::Multipart => {
                let fields = if plan.body_args.is_empty() {
                    "nil".to_string()
                } else {
                    self.w.line("_fields := map[string]string{}");
                    for var in &plan.body_args {
                        let name = quote(&var.name);
                        self.set_text(var, |value| format!("_fields[{name}] = {value}"));
                    }
                    "_fields".to_string()
                };
                self.w.open("_parts := []multipartPart{");
                for part in &plan.parts {
                    self.w.line(format!(
                        "{{name: {}, contentType: {}, reader: {}}},",
                        quote(&part.name),
                        quote(&part.content_type),
                        part.var.name
                    ));
                }
                self.w.close("}");
                self.w
                    .line(format!("_body, _contentType := newMultipartBody(_parts, {fields})"));
                Some("_contentType".to_string())
            }
        }
    }

    /// Results read from response headers.
    fn result_locations(&mut self, mapped: &[Mapped<'_>], getter: &str) {
        for Mapped { var, name } in mapped {
            let source = format!("{getter}({})", quote(name));
            self.assign_text(var, &source);
        }
    }

    fn result_cookies(&mut self) {
        let plan = self.plan;
        if plan.result_cookies.is_empty() {
            return;
        }
        self.w.open("for _, _cookie := range _httpResp.Cookies() {");
        self.w.open("switch _cookie.Name {");
        for Mapped { var, name } in &plan.result_cookies {
            self.w.line(format!("case {}:", quote(name)));
            self.w.indent();
            self.assign_text(var, "_cookie.Value");
            self.w.dedent();
        }
        self.w.close("}");
        self.w.close("}");
    }

    /// Assign a textual value to a result, scanning non-string types.
    fn assign_text(&mut self, var: &Variable, source: &str) {
        if var.type_ref.type_id == "string" && var.type_ref.pointer_count == 0 && !var.type_ref.is_container() {
            self.w.line(format!("{} = {source}", var.name));
        } else {
            self.imports.add("fmt");
            self.w
                .line(format!("_, _ = fmt.Sscan({source}, &{})", var.name));
        }
    }

    fn response(&mut self) {
        let plan = self.plan;
        match &plan.response {
            ResponseMode::None => {}
            ResponseMode::Inline(codec) => {
                self.read_body();
                let package = codec.import(plan.json_package, self.imports);
                let var = plan.body_results[0];
                self.w.open(format!(
                    "if err = {package}.Unmarshal(_data, &{}); err != nil {{",
                    var.name
                ));
                self.w.line("return");
                self.w.close("}");
            }
            ResponseMode::Struct(codec) => {
                self.read_body();
                let package = codec.import(plan.json_package, self.imports);
                self.w.line(format!("var _response {}", plan.response_type()));
                self.w.open(format!(
                    "if err = {package}.Unmarshal(_data, &_response); err != nil {{"
                ));
                self.w.line("return");
                self.w.close("}");
                self.assign_results(&plan.body_results);
            }
            ResponseMode::Stream => {
                self.w
                    .line(format!("{} = _httpResp.Body", plan.result_parts[0].var.name));
            }
            ResponseMode::Multipart => {
                self.imports.add("io");
                let names: Vec<String> = plan.result_parts.iter().map(|p| quote(&p.name)).collect();
                self.w.line("var _parts map[string]io.ReadCloser");
                self.w.open(format!(
                    "if _parts, err = readMultipart(_httpResp, {}); err != nil {{",
                    names.join(", ")
                ));
                self.w.line("return");
                self.w.close("}");
                for part in &plan.result_parts {
                    self.w
                        .line(format!("{} = _parts[{}]", part.var.name, quote(&part.name)));
                }
            }
        }
    }

    fn read_body(&mut self) {
        self.imports.add("io");
        self.w.line("var _data []byte");
        self.w
            .open("if _data, err = io.ReadAll(_httpResp.Body); err != nil {");
        self.w.line("return");
        self.w.close("}");
    }

    /// Textual form of `expr`, the dereferenced value of `var`.
    fn text_expr(&mut self, var: &Variable, expr: &str) -> String {
        if var.type_ref.type_id == "string" && !var.type_ref.is_container() {
            expr.to_string()
        } else {
            self.imports.add("fmt");
            format!("fmt.Sprint({expr})")
        }
    }

    /// Emit the statement setting a header, cookie, query or form value.
    /// Nil pointers are skipped.
    fn set_text(&mut self, var: &Variable, statement: impl FnOnce(&str) -> String) {
        let (guard, expr) = deref(var);
        let value = self.text_expr(var, &expr);
        match guard {
            Some(guard) => {
                self.w.open(format!("if {guard} {{"));
                self.w.line(statement(&value));
                self.w.close("}");
            }
            None => self.w.line(statement(&value)),
        }
    }
}

/// Nil checks for a pointer argument and the expression of its value.
fn deref(var: &Variable) -> (Option<String>, String) {
    let type_ref = &var.type_ref;
    if type_ref.pointer_count == 0 || type_ref.is_container() {
        return (None, var.name.clone());
    }
    let mut checks = Vec::new();
    let mut expr = var.name.clone();
    for _ in 0..type_ref.pointer_count {
        checks.push(format!("{expr} != nil"));
        expr = format!("*{expr}");
    }
    (Some(checks.join(" && ")), expr)
}
