//! Value rendering without intermediate allocations.

use crate::heap::{Heap, ManagedObject};
use tether_core::value::{TAG_DICT, TAG_LIST, TAG_MAP, TAG_NATIVE, TAG_SEQ, TAG_STR};
use tether_core::Value;

pub trait Appendable {
    fn append_str(&mut self, s: &str);
    fn append_i64(&mut self, i: i64);
    fn append_f64(&mut self, f: f64);
    fn append_bool(&mut self, b: bool);
    fn append_void(&mut self);
    fn append_value(&mut self, v: &Value, heap: &Heap);
}

impl Appendable for String {
    fn append_str(&mut self, s: &str) {
        self.push_str(s);
    }

    fn append_i64(&mut self, i: i64) {
        let mut buf = itoa::Buffer::new();
        self.push_str(buf.format(i));
    }

    fn append_f64(&mut self, f: f64) {
        if f.fract() == 0.0 && f.is_finite() {
            self.append_i64(f as i64);
        } else {
            let mut buf = ryu::Buffer::new();
            self.push_str(buf.format(f));
        }
    }

    fn append_bool(&mut self, b: bool) {
        self.push_str(if b { "true" } else { "false" });
    }

    fn append_void(&mut self) {
        self.push_str("()");
    }

    fn append_value(&mut self, v: &Value, heap: &Heap) {
        if v.is_int() {
            self.append_i64(v.as_i64());
        } else if v.is_f64() {
            self.append_f64(v.as_f64());
        } else if v.is_bool() {
            self.append_bool(v.as_bool());
        } else if v.is_void() {
            self.append_void();
        } else {
            let id = v.as_obj_id();
            match (v.get_tag(), heap.get(id)) {
                (TAG_STR, Some(ManagedObject::Str(s))) => self.append_str(s),
                (TAG_LIST, Some(ManagedObject::List(items))) => {
                    self.push('[');
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            self.push_str(", ");
                        }
                        self.append_value(item, heap);
                    }
                    self.push(']');
                }
                (TAG_DICT, Some(ManagedObject::Dict(map))) => {
                    self.push('{');
                    for (i, (k, val)) in map.iter().enumerate() {
                        if i > 0 {
                            self.push_str(", ");
                        }
                        self.push_str(k);
                        self.push_str(": ");
                        self.append_value(val, heap);
                    }
                    self.push('}');
                }
                (TAG_NATIVE, Some(_)) => {
                    self.push_str("<native#");
                    self.append_i64(id.0 as i64);
                    self.push('>');
                }
                (TAG_SEQ, Some(_)) => {
                    self.push_str("<seq#");
                    self.append_i64(id.0 as i64);
                    self.push('>');
                }
                (TAG_MAP, Some(_)) => {
                    self.push_str("<map#");
                    self.append_i64(id.0 as i64);
                    self.push('>');
                }
                _ => {
                    self.push_str("<freed#");
                    self.append_i64(id.0 as i64);
                    self.push('>');
                }
            }
        }
    }
}

pub fn value_to_string(v: &Value, heap: &Heap) -> String {
    let mut out = String::new();
    out.append_value(v, heap);
    out
}
