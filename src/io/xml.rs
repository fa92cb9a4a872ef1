//! XML plumbing shared by the manifest and annotation readers.
//!
//! The manifest is a namespaced XFDU document whose metadata is spread over
//! `metadataObject` wrappers, so it is parsed into an [`XmlNode`] tree keyed by
//! local (namespace-stripped) names and picked apart with a small XPath
//! subset: `.//a/b` finds every descendant `a` and then walks the child path
//! `b`, while `a/b` walks children from the current node only.
//!
//! Annotation records are deserialized with serde (see `io::annotation`);
//! both share the bounded query cache below.

use crate::types::{SarError, SarResult};
use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::any::Any;
use std::sync::{Arc, Mutex};

/// Maximum number of (file, query) results kept in memory
pub const QUERY_CACHE_CAPACITY: usize = 128;

lazy_static::lazy_static! {
    static ref QUERY_CACHE: Mutex<QueryCache> = Mutex::new(QueryCache::new(QUERY_CACHE_CAPACITY));
}

/// One XML element: local name, attributes, text content and children
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlNode {
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    /// Parse a document and return its root element
    pub fn parse(xml: &str) -> SarResult<XmlNode> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => stack.push(Self::open_element(&e)?),
                Ok(Event::Empty(e)) => {
                    let node = Self::open_element(&e)?;
                    Self::attach(&mut stack, &mut root, node);
                }
                Ok(Event::End(_)) => {
                    let node = stack.pop().ok_or_else(|| {
                        SarError::XmlParsing(format!(
                            "Unbalanced closing tag at position {}",
                            reader.buffer_position()
                        ))
                    })?;
                    Self::attach(&mut stack, &mut root, node);
                }
                Ok(Event::Text(t)) => {
                    if let Some(top) = stack.last_mut() {
                        let text = t
                            .unescape()
                            .map_err(|e| SarError::XmlParsing(format!("Invalid text content: {}", e)))?;
                        top.text.push_str(&text);
                    }
                }
                Ok(Event::CData(c)) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&String::from_utf8_lossy(&c));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(SarError::XmlParsing(format!(
                        "Error at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(SarError::XmlParsing(format!(
                "Unclosed element <{}>",
                stack[stack.len() - 1].name
            )));
        }
        root.ok_or_else(|| SarError::XmlParsing("Document has no root element".to_string()))
    }

    fn open_element(e: &BytesStart) -> SarResult<XmlNode> {
        let mut node = XmlNode {
            name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
            ..Default::default()
        };
        for attr in e.attributes() {
            let attr = attr.map_err(|e| SarError::XmlParsing(format!("Invalid attribute: {}", e)))?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            if attr.key.as_ref().starts_with(b"xmlns") {
                continue;
            }
            let value = attr
                .unescape_value()
                .map_err(|e| SarError::XmlParsing(format!("Invalid attribute value: {}", e)))?;
            node.attributes.insert(key, value.into_owned());
        }
        Ok(node)
    }

    fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => *root = Some(node),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All elements matching `query`, in document order
    pub fn find_all(&self, query: &str) -> Vec<&XmlNode> {
        let (descendant, path) = match query.strip_prefix(".//") {
            Some(rest) => (true, rest),
            None => (false, query.trim_start_matches("./")),
        };
        let mut steps = path.split('/').filter(|s| !s.is_empty());
        let first = match steps.next() {
            Some(first) => first,
            None => return vec![self],
        };

        let mut current: Vec<&XmlNode> = Vec::new();
        if descendant {
            self.collect_descendants(first, &mut current);
        } else {
            current.extend(self.children.iter().filter(|c| c.name == first));
        }
        for step in steps {
            current = current
                .into_iter()
                .flat_map(|n| n.children.iter().filter(move |c| c.name == step))
                .collect();
        }
        current
    }

    fn collect_descendants<'a>(&'a self, name: &str, out: &mut Vec<&'a XmlNode>) {
        for child in &self.children {
            if child.name == name {
                out.push(child);
            }
            child.collect_descendants(name, out);
        }
    }

    /// First element matching `query`
    pub fn find(&self, query: &str) -> Option<&XmlNode> {
        self.find_all(query).into_iter().next()
    }

    pub fn findtext(&self, query: &str) -> Option<&str> {
        self.find(query).map(|n| n.text.as_str())
    }
}

type CachedValue = Arc<dyn Any + Send + Sync>;

/// Bounded memo of query results, evicting the least recently used entry
struct QueryCache {
    capacity: usize,
    entries: IndexMap<(String, String), CachedValue>,
}

impl QueryCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: IndexMap::new(),
        }
    }

    fn get(&mut self, key: &(String, String)) -> Option<CachedValue> {
        let value = self.entries.shift_remove(key)?;
        self.entries.insert(key.clone(), value.clone());
        Some(value)
    }

    fn insert(&mut self, key: (String, String), value: CachedValue) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            self.entries.shift_remove_index(0);
        }
        self.entries.insert(key, value);
    }
}

/// Result of `query` against the document at `location`, memoized.
///
/// `load` is only called on a cache miss, or when the cached value for the
/// same key has another type. Results are shared immutably.
pub fn cached_query<T, F>(location: &str, query: &str, load: F) -> SarResult<Arc<T>>
where
    T: Send + Sync + 'static,
    F: FnOnce() -> SarResult<T>,
{
    let key = (location.to_string(), query.to_string());
    {
        let mut cache = QUERY_CACHE.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(hit) = cache.get(&key) {
            if let Ok(value) = hit.downcast::<T>() {
                return Ok(value);
            }
        }
    }

    log::debug!("Parsing {} for {}", location, query);
    let value = Arc::new(load()?);
    let cached: CachedValue = value.clone();

    let mut cache = QUERY_CACHE.lock().unwrap_or_else(|e| e.into_inner());
    cache.insert(key, cached);
    Ok(value)
}

/// Drop every memoized query result
pub fn clear_query_cache() {
    let mut cache = QUERY_CACHE.lock().unwrap_or_else(|e| e.into_inner());
    cache.entries.clear();
}
