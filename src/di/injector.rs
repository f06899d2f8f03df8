use crate::di::binding::disambiguate;
use crate::di::{Binding, Dependency, InjectionSite, Injectron, Parameter};
use crate::di::{Repository, Scope, Value};
use crate::error::{InjectError, Result};
use crate::types::{Instance, Name, RawType, Type};
use dashmap::DashMap;
use indexmap::IndexMap;
use std::any::{Any, type_name};
use std::collections::HashMap;
use std::sync::Arc;
use strum::IntoEnumIterator;

type SiteKey = (Dependency, usize);

/// The immutable, built-once resolution index.
///
/// Injectrons are grouped by the raw type of their resource; each group is
/// sorted most specific first, so the first applicable injectron of a group
/// is the one that serves a request. After [`Injector::build`] the index is
/// read-only and may be shared between threads freely.
pub struct Injector {
    groups: IndexMap<RawType, Arc<[Arc<Injectron>]>>,
    sites: DashMap<SiteKey, Arc<InjectionSite>>,
    len: usize,
}

impl Injector {
    pub fn build(bindings: impl IntoIterator<Item = Binding>) -> Result<Self> {
        let mut declared: IndexMap<RawType, Vec<Binding>> = IndexMap::new();
        for binding in bindings {
            declared
                .entry(binding.resource().ty().raw_type().clone())
                .or_default()
                .push(binding);
        }

        let mut settled = Vec::with_capacity(declared.len());
        let mut len = 0;
        for (raw, mut group) in declared {
            group.sort_by_key(|binding| binding.resource().specificity());
            let group = disambiguate(group)?;
            len += group.len();
            settled.push((raw, group));
        }

        let repositories: HashMap<Scope, Arc<dyn Repository>> = Scope::iter()
            .map(|scope| (scope, scope.repository(len)))
            .collect();
        let mut serial = 0;
        let mut groups = IndexMap::with_capacity(settled.len());
        for (raw, group) in settled {
            let injectrons: Arc<[Arc<Injectron>]> = group
                .into_iter()
                .map(|binding| {
                    let injectron = Injectron::new(
                        binding.resource().clone(),
                        binding.source().clone(),
                        binding.scope(),
                        serial,
                        Arc::clone(&repositories[&binding.scope()]),
                        Arc::clone(binding.supplier()),
                    );
                    serial += 1;
                    tracing::debug!("Bound {}", injectron);
                    Arc::new(injectron)
                })
                .collect();
            groups.insert(raw, injectrons);
        }

        tracing::info!(
            "Injector built with {} injectrons for {} raw types",
            len,
            groups.len()
        );
        Ok(Self {
            groups,
            sites: DashMap::new(),
            len,
        })
    }

    /// The most specific injectron directly applicable to `dependency`.
    pub fn injectron_for(&self, dependency: &Dependency) -> Option<Arc<Injectron>> {
        self.groups
            .get(dependency.ty().raw_type())?
            .iter()
            .find(|injectron| injectron.resource().is_applicable_for(dependency))
            .cloned()
    }

    /// Resolves `dependency`.
    ///
    /// A directly applicable injectron wins. Otherwise a request for a
    /// one-dimensional array is answered with every injectron applicable to
    /// its element, in specificity order; for a lower-bound element without
    /// a group of its own, every group whose raw type is a subtype of the
    /// bound is searched. The synthesized array is a `Vec<Value>`.
    pub fn resolve(&self, dependency: &Dependency) -> Result<Value> {
        if let Some(injectron) = self.injectron_for(dependency) {
            return injectron.instance_for(dependency, self);
        }
        let Some(element) = dependency
            .ty()
            .element_type()
            .filter(|_| dependency.ty().is_unidimensional_array())
        else {
            tracing::debug!("No candidate for {}", dependency);
            return Err(InjectError::no_candidate(dependency));
        };
        let elements = self.elements(dependency, element)?;
        if elements.is_empty() {
            tracing::debug!("No elements for {}", dependency);
            return Err(InjectError::no_candidate(dependency));
        }
        Ok(Arc::new(elements))
    }

    fn elements(&self, dependency: &Dependency, element: &Type) -> Result<Vec<Value>> {
        let name = match dependency.name() {
            Name::Default => Name::Any,
            name => name.clone(),
        };
        let request = dependency.instanced(Instance::new(name, element.clone()));
        let raw = element.raw_type();
        let candidates: Vec<&Arc<Injectron>> = match self.groups.get(raw) {
            Some(group) => group.iter().collect(),
            None if element.is_lower_bound() => self
                .groups
                .iter()
                .filter(|(group, _)| group.is_subtype_of(raw))
                .flat_map(|(_, group)| group.iter())
                .collect(),
            None => Vec::new(),
        };
        candidates
            .into_iter()
            .filter(|injectron| injectron.resource().is_applicable_for(&request))
            .map(|injectron| injectron.instance_for(&request, self))
            .collect()
    }

    pub fn resolve_as<T: Any + Send + Sync>(&self, dependency: &Dependency) -> Result<Arc<T>> {
        self.resolve(dependency)?
            .downcast::<T>()
            .map_err(|_| InjectError::DowncastFailed {
                type_name: type_name::<T>().to_string(),
            })
    }

    /// Resolves the default instance of `ty`.
    pub fn resolve_type(&self, ty: Type) -> Result<Value> {
        self.resolve(&Dependency::of(ty))
    }

    pub fn resolve_type_as<T: Any + Send + Sync>(&self, ty: Type) -> Result<Arc<T>> {
        self.resolve_as(&Dependency::of(ty))
    }

    pub fn resolve_named(&self, ty: Type, name: impl Into<Name>) -> Result<Value> {
        self.resolve(&Dependency::on(Instance::new(name, ty)))
    }

    /// Every value bound for `element`, most specific first.
    pub fn resolve_all(&self, element: Type) -> Result<Vec<Value>> {
        let all = self.resolve_type_as::<Vec<Value>>(Type::array_of(element))?;
        Ok(all.as_ref().clone())
    }

    /// The cached injection site for calling something with `parameters`
    /// on behalf of `dependency`.
    pub fn injection_site(
        &self,
        dependency: &Dependency,
        parameters: &Arc<[Parameter]>,
    ) -> Result<Arc<InjectionSite>> {
        let key = (
            dependency.clone(),
            Arc::as_ptr(parameters) as *const Parameter as usize,
        );
        if let Some(site) = self.sites.get(&key) {
            return Ok(site.value().clone());
        }
        // built outside the map, building resolves reentrantly
        let site = Arc::new(InjectionSite::new(dependency.clone(), self, parameters)?);
        self.sites.insert(key, Arc::clone(&site));
        Ok(site)
    }

    /// All injectrons, group by group in specificity order.
    pub fn injectrons(&self) -> impl Iterator<Item = &Arc<Injectron>> {
        self.groups.values().flat_map(|group| group.iter())
    }

    /// Whether some injectron has a resource of exactly `ty`'s raw type.
    pub fn contains(&self, ty: &Type) -> bool {
        self.groups.contains_key(ty.raw_type())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("injectrons", &self.len)
            .field("groups", &self.groups.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::{Bindings, Resource, Supplier, Target, constant, forward, value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Plugin;
    struct Transport;
    struct Mailer;
    struct Number;
    struct Integer;
    struct Float;
    struct Command;
    struct Controller;

    fn counting(count: &Arc<AtomicUsize>) -> impl Supplier + 'static {
        let count = Arc::clone(count);
        move |_: &Dependency, _: &Injector| -> anyhow::Result<Value> {
            Ok(value(count.fetch_add(1, Ordering::SeqCst)))
        }
    }

    fn command(argument: Type) -> Type {
        Type::of::<Command>().parameterized([argument])
    }

    fn names(values: &[Value]) -> Vec<&'static str> {
        values
            .iter()
            .map(|value| *value.downcast_ref::<&'static str>().unwrap())
            .collect()
    }

    #[test]
    fn test_single_binding_resolves() {
        let mut bindings = Bindings::new("test");
        bindings.bind_constant(Resource::of(Type::of::<Transport>()), "smtp");
        let injector = bindings.build().unwrap();

        let transport = injector
            .resolve_type_as::<&str>(Type::of::<Transport>())
            .unwrap();
        assert_eq!(*transport, "smtp");
        assert_eq!(injector.len(), 1);
        assert!(injector.contains(&Type::of::<Transport>()));
        assert!(!injector.contains(&Type::of::<Mailer>()));
    }

    #[test]
    fn test_exact_name_beats_wildcard_in_any_order() {
        let exact = Resource::new(Instance::new("smtp", Type::of::<Transport>()));
        let any = Resource::new(Instance::any_of(Type::of::<Transport>()));
        for resources in [[exact.clone(), any.clone()], [any, exact]] {
            let mut bindings = Bindings::new("test");
            for resource in resources {
                let label = if resource.instance().name().is_any() {
                    "any"
                } else {
                    "exact"
                };
                bindings.bind_constant(resource, label);
            }
            let injector = bindings.build().unwrap();

            let smtp = injector
                .resolve_named(Type::of::<Transport>(), "smtp")
                .unwrap();
            let other = injector
                .resolve_named(Type::of::<Transport>(), "imap")
                .unwrap();
            assert_eq!(smtp.downcast_ref::<&str>(), Some(&"exact"));
            assert_eq!(other.downcast_ref::<&str>(), Some(&"any"));
        }
    }

    #[test]
    fn test_application_scope_yields_same_instance() {
        let count = Arc::new(AtomicUsize::new(0));
        let produced = Arc::clone(&count);
        let mut bindings = Bindings::new("test");
        bindings.bind_fn(
            Resource::of(Type::of::<Mailer>()),
            Scope::Application,
            move |_, _| Ok(value(produced.fetch_add(1, Ordering::SeqCst))),
        );
        let injector = bindings.build().unwrap();

        let first = injector.resolve_type(Type::of::<Mailer>()).unwrap();
        let second = injector.resolve_type(Type::of::<Mailer>()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_injection_scope_produces_every_time() {
        let count = Arc::new(AtomicUsize::new(0));
        let produced = Arc::clone(&count);
        let mut bindings = Bindings::new("test");
        bindings.bind_fn(
            Resource::of(Type::of::<Mailer>()),
            Scope::Injection,
            move |_, _| Ok(value(produced.fetch_add(1, Ordering::SeqCst))),
        );
        let injector = bindings.build().unwrap();

        for expected in 0..3usize {
            let mailer = injector
                .resolve_type_as::<usize>(Type::of::<Mailer>())
                .unwrap();
            assert_eq!(*mailer, expected);
        }
    }

    #[test]
    fn test_ignored_expiry_bypasses_cache_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let produced = Arc::clone(&count);
        let mut bindings = Bindings::new("test");
        bindings.bind_fn(
            Resource::of(Type::of::<Mailer>()),
            Scope::Application,
            move |_, _| Ok(value(produced.fetch_add(1, Ordering::SeqCst))),
        );
        let injector = bindings.build().unwrap();
        let dependency = Dependency::of(Type::of::<Mailer>());

        let cached = injector.resolve_as::<usize>(&dependency).unwrap();
        let fresh = injector
            .resolve_as::<usize>(&dependency.ignored_expiry())
            .unwrap();
        let again = injector.resolve_as::<usize>(&dependency).unwrap();

        assert_eq!((*cached, *fresh, *again), (0, 1, 0));
    }

    #[test]
    fn test_dependency_instance_scope_caches_per_name() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut bindings = Bindings::new("test");
        bindings.bind(
            Resource::new(Instance::any_of(Type::of::<Transport>())),
            Scope::DependencyInstance,
            counting(&count),
        );
        let injector = bindings.build().unwrap();

        let smtp = injector.resolve_named(Type::of::<Transport>(), "smtp").unwrap();
        let imap = injector.resolve_named(Type::of::<Transport>(), "imap").unwrap();
        let again = injector.resolve_named(Type::of::<Transport>(), "smtp").unwrap();

        assert!(Arc::ptr_eq(&smtp, &again));
        assert!(!Arc::ptr_eq(&smtp, &imap));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dependency_type_scope_ignores_names() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut bindings = Bindings::new("test");
        bindings.bind(
            Resource::new(Instance::any_of(Type::of::<Command>())),
            Scope::DependencyType,
            counting(&count),
        );
        let injector = bindings.build().unwrap();

        let of_i32 = injector.resolve_type(command(Type::of::<i32>())).unwrap();
        let named = injector
            .resolve_named(command(Type::of::<i32>()), "calc")
            .unwrap();
        let of_i64 = injector.resolve_type(command(Type::of::<i64>())).unwrap();

        assert!(Arc::ptr_eq(&of_i32, &named));
        assert!(!Arc::ptr_eq(&of_i32, &of_i64));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_target_instance_scope_caches_per_target() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut bindings = Bindings::new("test");
        bindings
            .bind(
                Resource::of(Type::of::<Transport>()),
                Scope::TargetInstance,
                counting(&count),
            )
            .bind_forward(
                Resource::of(Type::of::<Mailer>()),
                Scope::Injection,
                Instance::of(Type::of::<Transport>()),
            )
            .bind_forward(
                Resource::of(Type::of::<Controller>()),
                Scope::Injection,
                Instance::of(Type::of::<Transport>()),
            );
        let injector = bindings.build().unwrap();

        let for_mailer = injector.resolve_type(Type::of::<Mailer>()).unwrap();
        let for_mailer_again = injector.resolve_type(Type::of::<Mailer>()).unwrap();
        let for_controller = injector.resolve_type(Type::of::<Controller>()).unwrap();
        let at_root = injector.resolve_type(Type::of::<Transport>()).unwrap();

        assert!(Arc::ptr_eq(&for_mailer, &for_mailer_again));
        assert!(!Arc::ptr_eq(&for_mailer, &for_controller));
        assert!(!Arc::ptr_eq(&for_mailer, &at_root));
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_thread_scope_caches_per_thread() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut bindings = Bindings::new("test");
        bindings.bind(
            Resource::of(Type::of::<Mailer>()),
            Scope::Thread,
            counting(&count),
        );
        let injector = bindings.build().unwrap();

        let here = injector.resolve_type(Type::of::<Mailer>()).unwrap();
        let again = injector.resolve_type(Type::of::<Mailer>()).unwrap();
        let elsewhere = std::thread::scope(|scope| {
            scope
                .spawn(|| injector.resolve_type(Type::of::<Mailer>()).unwrap())
                .join()
                .unwrap()
        });

        assert!(Arc::ptr_eq(&here, &again));
        assert!(!Arc::ptr_eq(&here, &elsewhere));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_exact_parameterization_beats_earlier_sibling() {
        let number = RawType::of::<Number>();
        let integer = Type::raw(RawType::of::<Integer>().extending([number.clone()]));
        let mut bindings = Bindings::new("test");
        bindings
            .bind_constant(Resource::of(command(integer.clone())), "of integer")
            .bind_constant(Resource::of(command(Type::raw(number.clone()))), "of number");
        let injector = bindings.build().unwrap();

        let of_number = injector
            .resolve_type_as::<&str>(command(Type::raw(number)))
            .unwrap();
        let of_integer = injector
            .resolve_type_as::<&str>(command(integer))
            .unwrap();
        assert_eq!(*of_number, "of number");
        assert_eq!(*of_integer, "of integer");
    }

    #[test]
    fn test_generic_application_binding_resolves_own_parameterization() {
        let mut bindings = Bindings::new("test");
        bindings.bind_fn(
            Resource::of(Type::of::<Command>()),
            Scope::Application,
            |dependency, injector| {
                if dependency.ty().parameter(0) != Some(&Type::of::<i32>()) {
                    return Ok(value(dependency.ty().to_string()));
                }
                let inner = injector.resolve_type_as::<String>(command(Type::of::<i64>()))?;
                Ok(value(format!("{} after {inner}", dependency.ty())))
            },
        );
        let injector = bindings.build().unwrap();

        let outer = injector
            .resolve_type_as::<String>(command(Type::of::<i32>()))
            .unwrap();
        assert_eq!(outer.as_str(), "Command<i32> after Command<i64>");

        let cached = injector
            .resolve_type_as::<String>(command(Type::of::<i64>()))
            .unwrap();
        assert!(Arc::ptr_eq(&outer, &cached));
    }

    #[test]
    fn test_array_of_candidates_in_specificity_order() {
        let mut bindings = Bindings::new("test");
        bindings
            .multibind(
                Resource::new(Instance::any_of(Type::of::<Plugin>())),
                Scope::Application,
                constant(value("fallback")),
            )
            .multibind(
                Resource::new(Instance::new("plug*", Type::of::<Plugin>())),
                Scope::Application,
                constant(value("pattern")),
            )
            .multibind(
                Resource::new(Instance::new("primary", Type::of::<Plugin>())),
                Scope::Application,
                constant(value("primary")),
            );
        let injector = bindings.build().unwrap();

        let plugins = injector.resolve_all(Type::of::<Plugin>()).unwrap();
        assert_eq!(names(&plugins), vec!["primary", "pattern", "fallback"]);
    }

    #[test]
    fn test_array_without_candidates_fails() {
        let mut bindings = Bindings::new("test");
        bindings.bind_constant(Resource::of(Type::of::<Mailer>()), "mailer");
        let injector = bindings.build().unwrap();

        let result = injector.resolve_all(Type::of::<Plugin>());
        assert!(matches!(result, Err(InjectError::NoCandidate { .. })));
    }

    #[test]
    fn test_lower_bound_array_scans_subtypes() {
        let number = RawType::of::<Number>();
        let integer = Type::raw(RawType::of::<Integer>().extending([number.clone()]));
        let float = Type::raw(RawType::of::<Float>().extending([number.clone()]));
        let mut bindings = Bindings::new("test");
        bindings
            .bind_constant(Resource::of(integer), "integer")
            .bind_constant(Resource::of(float), "float")
            .bind_constant(Resource::of(Type::of::<Mailer>()), "mailer");
        let injector = bindings.build().unwrap();

        let numbers = injector
            .resolve_all(Type::raw(number).lower_bound())
            .unwrap();
        assert_eq!(names(&numbers), vec!["integer", "float"]);

        let everything = injector.resolve_all(Type::wildcard()).unwrap();
        assert_eq!(everything.len(), 3);
    }

    #[test]
    fn test_lower_bound_array_without_subtypes_fails() {
        let number = RawType::of::<Number>();
        let mut bindings = Bindings::new("test");
        bindings
            .bind_constant(Resource::of(Type::of::<Mailer>()), "mailer")
            .bind_constant(Resource::of(Type::of::<Integer>()), "unrelated integer");
        let injector = bindings.build().unwrap();

        let result = injector.resolve_all(Type::raw(number).lower_bound());
        assert!(matches!(result, Err(InjectError::NoCandidate { .. })));
    }

    #[test]
    fn test_cycle_is_detected() {
        let mut bindings = Bindings::new("test");
        bindings
            .bind(
                Resource::of(Type::of::<Mailer>()),
                Scope::Injection,
                forward(Instance::of(Type::of::<Transport>())),
            )
            .bind(
                Resource::of(Type::of::<Transport>()),
                Scope::Injection,
                forward(Instance::of(Type::of::<Mailer>())),
            );
        let injector = bindings.build().unwrap();

        let result = injector.resolve_type(Type::of::<Mailer>());
        assert!(matches!(result, Err(InjectError::DependencyCycle { .. })));
    }

    #[test]
    fn test_duplicate_explicit_bindings_fail_to_build() {
        let mut bindings = Bindings::new("test");
        bindings
            .bind_constant(Resource::of(Type::of::<Mailer>()), "first")
            .bind_constant(Resource::of(Type::of::<Mailer>()), "second");
        let result = bindings.build();
        assert!(matches!(result, Err(InjectError::AmbiguousBinding { .. })));
    }

    #[test]
    fn test_targeted_binding_only_inside_its_target() {
        let mailer = Instance::of(Type::of::<Mailer>());
        let mut bindings = Bindings::new("test");
        bindings
            .bind_constant(Resource::of(Type::of::<Transport>()), "default")
            .bind_constant(
                Resource::of(Type::of::<Transport>()).targeted(Target::injecting_into(mailer)),
                "for mailer",
            )
            .bind(
                Resource::of(Type::of::<Mailer>()),
                Scope::Injection,
                forward(Instance::of(Type::of::<Transport>())),
            );
        let injector = bindings.build().unwrap();

        let direct = injector
            .resolve_type_as::<&str>(Type::of::<Transport>())
            .unwrap();
        let nested = injector
            .resolve_type_as::<&str>(Type::of::<Mailer>())
            .unwrap();
        assert_eq!(*direct, "default");
        assert_eq!(*nested, "for mailer");
    }

    #[test]
    fn test_failing_supplier_reports_source() {
        let mut bindings = Bindings::new("mail");
        bindings.bind_fn(
            Resource::of(Type::of::<Mailer>()),
            Scope::Application,
            |_, _| Err(anyhow::anyhow!("no smtp host")),
        );
        let injector = bindings.build().unwrap();

        match injector.resolve_type(Type::of::<Mailer>()) {
            Err(InjectError::ConstructionFailure { origin, error, .. }) => {
                assert_eq!(origin, "mail#0 [Explicit]");
                assert_eq!(error.to_string(), "no smtp host");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
