// 单元测试用的托管运行时与路径探测替身，记录每一次调用
use crate::config::EntryPoint;
use crate::errno::Errno;
use crate::loader::{DexLoadRequest, PathProbe};
use crate::runtime::{ClassLookup, ManagedRuntime};
use std::cell::RefCell;
use std::ffi::{CStr, CString};

#[derive(Clone, Debug)]
pub(crate) enum FakeText {
    Value(CString),
    // 运行时无法取出字节
    Unreadable,
}

impl FakeText {
    pub(crate) fn new(value: &str) -> Self {
        Self::Value(CString::new(value).unwrap())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Call {
    ReadText,
    SystemLoader,
    DexLoader {
        dex_path: String,
        staging_dir: String,
    },
    ClassLookup(ClassLookup),
    LoadClass {
        lookup: ClassLookup,
        class_name: String,
    },
    StaticEntry {
        method: String,
        signature: String,
    },
    Invoke {
        argument: String,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Step {
    SystemLoader,
    DexLoader,
    LoadClass,
    StaticEntry,
    Invoke,
}

#[derive(Default)]
pub(crate) struct FakeRuntime {
    pub(crate) calls: Vec<Call>,
    pub(crate) fail_at: Option<Step>,
    pub(crate) missing_lookups: Vec<ClassLookup>,
}

impl FakeRuntime {
    pub(crate) fn failing_at(step: Step) -> Self {
        Self {
            fail_at: Some(step),
            ..Self::default()
        }
    }

    pub(crate) fn loader_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| !matches!(call, Call::ReadText))
            .count()
    }

    pub(crate) fn invocations(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Invoke { argument } => Some(argument.as_str()),
                _ => None,
            })
            .collect()
    }

    fn step(&self, step: Step, errno: Errno) -> Result<(), Errno> {
        if self.fail_at == Some(step) {
            return Err(errno);
        }
        Ok(())
    }
}

fn lossy(value: &CStr) -> String {
    value.to_string_lossy().into_owned()
}

impl ManagedRuntime for FakeRuntime {
    type Text = FakeText;
    type Loader = u32;
    type Class = String;
    type Lookup = ClassLookup;
    type Entry = String;

    fn read_text(&mut self, text: &FakeText) -> Option<CString> {
        self.calls.push(Call::ReadText);
        match text {
            FakeText::Value(value) => Some(value.clone()),
            FakeText::Unreadable => None,
        }
    }

    fn system_loader(&mut self) -> Result<u32, Errno> {
        self.calls.push(Call::SystemLoader);
        self.step(Step::SystemLoader, Errno::NoSystemLoader)?;
        Ok(1)
    }

    fn dex_loader(&mut self, request: &DexLoadRequest<'_>, parent: &u32) -> Result<u32, Errno> {
        self.calls.push(Call::DexLoader {
            dex_path: lossy(request.dex_path),
            staging_dir: lossy(&request.staging_dir),
        });
        self.step(Step::DexLoader, Errno::NoDexLoader)?;
        Ok(parent + 1)
    }

    fn class_lookup(&mut self, lookup: ClassLookup) -> Result<ClassLookup, Errno> {
        self.calls.push(Call::ClassLookup(lookup));
        if self.missing_lookups.contains(&lookup) {
            return Err(Errno::NoClassLookup);
        }
        Ok(lookup)
    }

    fn load_class(
        &mut self,
        _loader: &u32,
        lookup: &ClassLookup,
        class_name: &CStr,
    ) -> Result<String, Errno> {
        self.calls.push(Call::LoadClass {
            lookup: *lookup,
            class_name: lossy(class_name),
        });
        self.step(Step::LoadClass, Errno::ClassNotFound)?;
        Ok(lossy(class_name))
    }

    fn static_entry(&mut self, _class: &String, entry: &EntryPoint) -> Result<String, Errno> {
        self.calls.push(Call::StaticEntry {
            method: entry.method.to_string(),
            signature: entry.signature.to_string(),
        });
        self.step(Step::StaticEntry, Errno::EntryNotFound)?;
        Ok(entry.method.to_string())
    }

    fn invoke_entry(&mut self, _class: &String, _entry: &String, argument: &CStr) -> Result<(), Errno> {
        self.calls.push(Call::Invoke {
            argument: lossy(argument),
        });
        self.step(Step::Invoke, Errno::InvokeFailed)
    }
}

// 固定存在的路径集合，并按顺序记录被探测的路径
#[derive(Default)]
pub(crate) struct FixtureProbe {
    existing: Vec<CString>,
    pub(crate) probed: RefCell<Vec<CString>>,
}

impl FixtureProbe {
    pub(crate) fn with(paths: &[&CStr]) -> Self {
        Self {
            existing: paths.iter().map(|path| (*path).to_owned()).collect(),
            probed: RefCell::default(),
        }
    }

    pub(crate) fn probed(&self) -> Vec<CString> {
        self.probed.borrow().clone()
    }
}

impl PathProbe for FixtureProbe {
    fn exists(&self, path: &CStr) -> bool {
        self.probed.borrow_mut().push(path.to_owned());
        self.existing.iter().any(|existing| existing.as_c_str() == path)
    }
}
